use serde::{Deserialize, Serialize};
use std::fmt;
use worldenv_common::SimTime;

use crate::descriptor::AtmosphereModel;
use crate::field::{Field, FieldSample, Probe};

/// Scale height the layer band boundaries are expressed against (m).
const REFERENCE_SCALE_HEIGHT_M: f64 = 8_500.0;

/// Upper edges of the layer bands for the reference scale height (m).
const LAYER_BANDS: [(f64, AtmosphereLayer); 5] = [
    (12_000.0, AtmosphereLayer::Troposphere),
    (50_000.0, AtmosphereLayer::Stratosphere),
    (80_000.0, AtmosphereLayer::Mesosphere),
    (600_000.0, AtmosphereLayer::Thermosphere),
    (1_000_000.0, AtmosphereLayer::Exosphere),
];

/// Altitude band of an atmosphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphereLayer {
    Surface,
    Troposphere,
    Stratosphere,
    Mesosphere,
    Thermosphere,
    Exosphere,
    Vacuum,
}

impl fmt::Display for AtmosphereLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Surface => "surface",
            Self::Troposphere => "troposphere",
            Self::Stratosphere => "stratosphere",
            Self::Mesosphere => "mesosphere",
            Self::Thermosphere => "thermosphere",
            Self::Exosphere => "exosphere",
            Self::Vacuum => "vacuum",
        };
        f.write_str(name)
    }
}

/// Earth's layer bands: below the datum is `Surface`, above 1000 km is `Vacuum`.
pub fn classify_layer(altitude_m: f64) -> AtmosphereLayer {
    if altitude_m < 0.0 {
        return AtmosphereLayer::Surface;
    }
    LAYER_BANDS
        .iter()
        .find(|(top, _)| altitude_m < *top)
        .map_or(AtmosphereLayer::Vacuum, |(_, layer)| *layer)
}

/// Exponential density profile `ρ0 · exp(-h / H)` between the datum and the cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct AtmosphereField {
    pub sea_level_density: f64,
    pub scale_height_m: f64,
    pub max_height_m: Option<f64>,
}

impl AtmosphereField {
    pub fn from_model(model: &AtmosphereModel) -> Self {
        Self {
            sea_level_density: model.sea_level_density,
            scale_height_m: model.scale_height_m,
            max_height_m: model.max_height_m,
        }
    }

    /// Density at a height above the datum (kg/m³).
    pub fn density_at_altitude(&self, altitude_m: f64) -> f64 {
        if altitude_m < 0.0 {
            return 0.0;
        }
        if self.max_height_m.is_some_and(|max| altitude_m > max) {
            return 0.0;
        }
        self.sea_level_density * (-altitude_m / self.scale_height_m).exp()
    }

    /// Layer band at a height above the datum. Bands stretch with the scale
    /// height; everything above the cutoff is `Vacuum`.
    pub fn layer_at(&self, altitude_m: f64) -> AtmosphereLayer {
        if self.max_height_m.is_some_and(|max| altitude_m > max) {
            return AtmosphereLayer::Vacuum;
        }
        classify_layer(altitude_m * REFERENCE_SCALE_HEIGHT_M / self.scale_height_m)
    }
}

impl Field for AtmosphereField {
    fn name(&self) -> &str {
        "atmosphere"
    }

    fn sample(&self, probe: &Probe, _time: SimTime) -> FieldSample {
        FieldSample {
            density: self.density_at_altitude(probe.altitude_m),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> AtmosphereField {
        AtmosphereField {
            sea_level_density: 1.225,
            scale_height_m: 8_500.0,
            max_height_m: Some(120_000.0),
        }
    }

    #[test]
    fn sea_level_density() {
        assert_eq!(earth().density_at_altitude(0.0), 1.225);
    }

    #[test]
    fn drops_by_e_per_scale_height() {
        let d = earth().density_at_altitude(8_500.0);
        assert!((d - 1.225 / std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn zero_below_datum_and_above_cutoff() {
        let a = earth();
        assert_eq!(a.density_at_altitude(-10.0), 0.0);
        assert_eq!(a.density_at_altitude(120_001.0), 0.0);
        assert!(a.density_at_altitude(119_999.0) > 0.0);
    }

    #[test]
    fn unbounded_without_cutoff() {
        let a = AtmosphereField {
            max_height_m: None,
            ..earth()
        };
        assert!(a.density_at_altitude(500_000.0) > 0.0);
    }

    #[test]
    fn classifies_earth_bands() {
        assert_eq!(classify_layer(-1.0), AtmosphereLayer::Surface);
        assert_eq!(classify_layer(0.0), AtmosphereLayer::Troposphere);
        assert_eq!(classify_layer(11_999.0), AtmosphereLayer::Troposphere);
        assert_eq!(classify_layer(12_000.0), AtmosphereLayer::Stratosphere);
        assert_eq!(classify_layer(50_000.0), AtmosphereLayer::Mesosphere);
        assert_eq!(classify_layer(80_000.0), AtmosphereLayer::Thermosphere);
        assert_eq!(classify_layer(600_000.0), AtmosphereLayer::Exosphere);
        assert_eq!(classify_layer(1_000_000.0), AtmosphereLayer::Vacuum);
    }

    #[test]
    fn layers_stop_at_cutoff_and_scale_with_height() {
        let a = earth();
        assert_eq!(a.layer_at(100_000.0), AtmosphereLayer::Thermosphere);
        assert_eq!(a.layer_at(120_001.0), AtmosphereLayer::Vacuum);

        let thin = AtmosphereField {
            scale_height_m: 4_250.0,
            max_height_m: None,
            ..earth()
        };
        assert_eq!(thin.layer_at(7_000.0), AtmosphereLayer::Stratosphere);
        assert_eq!(AtmosphereLayer::Mesosphere.to_string(), "mesosphere");
    }
}
