use worldenv_common::SimTime;

use crate::descriptor::AtmosphereModel;
use crate::field::{Field, FieldSample, Probe};

/// Hydrostatic pressure of an exponential atmosphere.
///
/// Integrating `dP = -ρ g dh` over `ρ0 · exp(-h/H)` gives `P = ρ · g · H`, so the
/// pressure follows from the merged density and radial gravity alone.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureField {
    pub scale_height_m: f64,
}

impl PressureField {
    pub fn from_model(atmosphere: &AtmosphereModel) -> Self {
        Self {
            scale_height_m: atmosphere.scale_height_m,
        }
    }

    pub fn pressure(&self, density: f64, gravity_radial: f64) -> f64 {
        density * gravity_radial.max(0.0) * self.scale_height_m
    }
}

impl Field for PressureField {
    fn name(&self) -> &str {
        "pressure"
    }

    fn derive(&self, _probe: &Probe, _time: SimTime, env: &FieldSample) -> FieldSample {
        FieldSample {
            pressure: self.pressure(env.density, env.gravity_radial),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earth_sea_level_is_about_one_atmosphere() {
        let p = PressureField {
            scale_height_m: 8_500.0,
        }
        .pressure(1.225, 9.80665);
        assert!((p - 101_325.0).abs() / 101_325.0 < 0.02, "got {p}");
    }

    #[test]
    fn no_pressure_without_density_or_downward_gravity() {
        let field = PressureField {
            scale_height_m: 8_500.0,
        };
        assert_eq!(field.pressure(0.0, 9.8), 0.0);
        assert_eq!(field.pressure(1.0, -9.8), 0.0);
    }
}
