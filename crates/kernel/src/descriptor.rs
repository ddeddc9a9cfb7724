//! Environment descriptors: the authoritative definition of a world's physical setup.
//!
//! A descriptor is plain data. `WorldEnvironment::from_descriptor` turns it into
//! a stack of sampling fields.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::chemistry::{AtmosphereChemistry, GasComposition};
use crate::error::{KernelError, Result};
use crate::field::Probe;
use crate::fields::{AtmosphereField, AtmosphereLayer};

/// How "up" is defined in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpModel {
    /// Away from the world origin (planets).
    Radial,
    /// A fixed direction everywhere (habitats, flat test worlds).
    Axial { axis: [f64; 3] },
}

/// Spatial assumptions of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSpace {
    /// Distance of the reference surface from the origin (meters).
    /// This is altitude 0.
    pub surface_radius_m: f64,
    pub up_model: UpModel,
}

impl WorldSpace {
    pub fn radial(surface_radius_m: f64) -> Self {
        Self {
            surface_radius_m,
            up_model: UpModel::Radial,
        }
    }

    pub fn axial(surface_radius_m: f64, axis: [f64; 3]) -> Self {
        Self {
            surface_radius_m,
            up_model: UpModel::Axial { axis },
        }
    }

    /// Unit "up" vector at a point in world-local coordinates.
    pub fn up_at(&self, point: DVec3) -> DVec3 {
        match &self.up_model {
            UpModel::Radial => point.try_normalize().unwrap_or(DVec3::Z),
            UpModel::Axial { axis } => DVec3::from_array(*axis).try_normalize().unwrap_or(DVec3::Z),
        }
    }

    /// Height above the reference surface.
    pub fn altitude_m(&self, point: DVec3) -> f64 {
        match &self.up_model {
            UpModel::Radial => point.length() - self.surface_radius_m,
            UpModel::Axial { .. } => point.dot(self.up_at(point)) - self.surface_radius_m,
        }
    }

    /// Point at `altitude_m` above the surface along `direction`.
    ///
    /// Under `Radial`, `direction` picks the spot on the sphere and altitudes
    /// below the center clamp to the origin. Under `Axial`, its horizontal
    /// component picks the spot on the plane.
    pub fn point_at_altitude(&self, direction: DVec3, altitude_m: f64) -> DVec3 {
        let height = self.surface_radius_m + altitude_m;
        match &self.up_model {
            UpModel::Radial => direction.try_normalize().unwrap_or(DVec3::Z) * height.max(0.0),
            UpModel::Axial { .. } => {
                let up = self.up_at(direction);
                let horizontal = direction - up * direction.dot(up);
                horizontal + up * height
            }
        }
    }

    /// Horizontal coordinates used to address the surface, scaled so that one
    /// unit spans one surface radius.
    pub fn surface_coords(&self, point: DVec3) -> DVec3 {
        match &self.up_model {
            UpModel::Radial => point.try_normalize().unwrap_or(DVec3::Z),
            UpModel::Axial { .. } => {
                let up = self.up_at(point);
                let horizontal = point - up * point.dot(up);
                horizontal / self.surface_radius_m
            }
        }
    }

    pub fn probe(&self, point: DVec3) -> Probe {
        Probe {
            position: point,
            up: self.up_at(point),
            radius_m: point.length(),
            altitude_m: self.altitude_m(point),
            surface: self.surface_coords(point),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.surface_radius_m.is_finite() || self.surface_radius_m <= 0.0 {
            return Err(KernelError::invalid(
                "space.surface_radius_m",
                format!("must be finite and positive, got {}", self.surface_radius_m),
            ));
        }
        if let UpModel::Axial { axis } = &self.up_model {
            validate_direction("space.up_model.axis", axis)?;
        }
        Ok(())
    }
}

/// Direction model of a world's baseline gravity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GravityKind {
    /// Toward the origin, falling off with the inverse square above the surface.
    Radial,
    /// Constant direction everywhere.
    Uniform { direction: [f64; 3] },
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityModel {
    pub kind: GravityKind,
    /// Acceleration magnitude at the reference surface (m/s²).
    pub strength: f64,
}

/// Bulk phase of matter at a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Medium {
    #[default]
    Vacuum,
    Gas,
    Liquid,
    Solid,
}

impl Medium {
    pub fn is_fluid(self) -> bool {
        matches!(self, Medium::Gas | Medium::Liquid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumModel {
    /// What exists above the surface if nothing else overrides it.
    pub default: Medium,
}

/// Shape of the solid surface relative to the reference surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum LandModel {
    /// Land height is 0 everywhere.
    #[default]
    Flat,
    /// Deterministic hash noise over the surface.
    Noise {
        /// Peak deviation in meters.
        #[serde(default = "default_noise_amplitude")]
        amplitude_m: f64,
        /// Lower is coarser.
        #[serde(default = "default_noise_frequency")]
        frequency: f64,
        /// Negative values sink more of the surface below the datum.
        #[serde(default = "default_noise_bias")]
        bias: f64,
    },
}

fn default_noise_amplitude() -> f64 {
    4_000.0
}

fn default_noise_frequency() -> f64 {
    0.5
}

fn default_noise_bias() -> f64 {
    -0.3
}

impl LandModel {
    /// Earth-like noise: ±4 km relief, mostly ocean.
    pub fn earth_like() -> Self {
        Self::Noise {
            amplitude_m: default_noise_amplitude(),
            frequency: default_noise_frequency(),
            bias: default_noise_bias(),
        }
    }
}

/// Exponential atmosphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereModel {
    /// Density at altitude 0 (kg/m³).
    pub sea_level_density: f64,
    /// e-folding height of the density falloff (m).
    pub scale_height_m: f64,
    /// Hard cutoff above which there is no atmosphere (m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height_m: Option<f64>,
    /// Mole fractions of the gases making up the atmosphere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<GasComposition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureModel {
    /// Temperature at altitude 0 (K).
    pub surface_temp_k: f64,
    /// Linear change with altitude (K/m). Negative cools with height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lapse_rate_k_per_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureModel {
    /// Derive hydrostatic pressure from atmospheric density and gravity.
    pub derive_from_density: bool,
}

/// The authoritative definition of a world's environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEnvDescriptor {
    pub space: WorldSpace,
    pub gravity: GravityModel,
    pub medium: MediumModel,

    #[serde(default)]
    pub land: LandModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<AtmosphereModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<PressureModel>,
}

impl WorldEnvDescriptor {
    /// Check every model for physically meaningful values.
    pub fn validate(&self) -> Result<()> {
        self.space.validate()?;

        if !self.gravity.strength.is_finite() || self.gravity.strength < 0.0 {
            return Err(KernelError::invalid(
                "gravity.strength",
                format!("must be finite and non-negative, got {}", self.gravity.strength),
            ));
        }
        if let GravityKind::Uniform { direction } = &self.gravity.kind {
            validate_direction("gravity.kind.direction", direction)?;
        }

        if let LandModel::Noise {
            amplitude_m,
            frequency,
            bias,
        } = &self.land
        {
            if !amplitude_m.is_finite() || *amplitude_m < 0.0 {
                return Err(KernelError::invalid(
                    "land.amplitude_m",
                    format!("must be finite and non-negative, got {amplitude_m}"),
                ));
            }
            if !frequency.is_finite() || *frequency <= 0.0 {
                return Err(KernelError::invalid(
                    "land.frequency",
                    format!("must be finite and positive, got {frequency}"),
                ));
            }
            if !bias.is_finite() {
                return Err(KernelError::invalid("land.bias", "must be finite"));
            }
        }

        if let Some(atmosphere) = &self.atmosphere {
            if !atmosphere.sea_level_density.is_finite() || atmosphere.sea_level_density < 0.0 {
                return Err(KernelError::invalid(
                    "atmosphere.sea_level_density",
                    format!(
                        "must be finite and non-negative, got {}",
                        atmosphere.sea_level_density
                    ),
                ));
            }
            if !atmosphere.scale_height_m.is_finite() || atmosphere.scale_height_m <= 0.0 {
                return Err(KernelError::invalid(
                    "atmosphere.scale_height_m",
                    format!("must be finite and positive, got {}", atmosphere.scale_height_m),
                ));
            }
            if let Some(max) = atmosphere.max_height_m {
                if !max.is_finite() || max <= 0.0 {
                    return Err(KernelError::invalid(
                        "atmosphere.max_height_m",
                        format!("must be finite and positive, got {max}"),
                    ));
                }
            }
            if let Some(composition) = &atmosphere.composition {
                composition.validate()?;
            }
        }

        if let Some(temperature) = &self.temperature {
            if !temperature.surface_temp_k.is_finite() || temperature.surface_temp_k < 0.0 {
                return Err(KernelError::invalid(
                    "temperature.surface_temp_k",
                    format!(
                        "must be finite and non-negative, got {}",
                        temperature.surface_temp_k
                    ),
                ));
            }
            if let Some(lapse) = temperature.lapse_rate_k_per_m {
                if !lapse.is_finite() {
                    return Err(KernelError::invalid(
                        "temperature.lapse_rate_k_per_m",
                        "must be finite",
                    ));
                }
            }
        }

        if let Some(pressure) = &self.pressure {
            if pressure.derive_from_density && self.atmosphere.is_none() {
                return Err(KernelError::invalid(
                    "pressure.derive_from_density",
                    "requires an atmosphere model",
                ));
            }
        }

        Ok(())
    }

    /// Whether pressure should be derived during sampling.
    pub fn derives_pressure(&self) -> bool {
        self.atmosphere.is_some()
            && self
                .pressure
                .as_ref()
                .is_some_and(|p| p.derive_from_density)
    }

    /// Sampler for per-species values, when the atmosphere names its gases.
    pub fn chemistry(&self) -> Option<AtmosphereChemistry> {
        self.atmosphere
            .as_ref()
            .and_then(|a| a.composition.clone())
            .map(AtmosphereChemistry::new)
    }

    /// Atmospheric layer at an altitude. Worlds without an atmosphere are
    /// `Vacuum` above the datum.
    pub fn layer_at(&self, altitude_m: f64) -> AtmosphereLayer {
        match &self.atmosphere {
            Some(model) => AtmosphereField::from_model(model).layer_at(altitude_m),
            None if altitude_m < 0.0 => AtmosphereLayer::Surface,
            None => AtmosphereLayer::Vacuum,
        }
    }
}

fn validate_direction(field: &'static str, v: &[f64; 3]) -> Result<()> {
    let d = DVec3::from_array(*v);
    if !d.is_finite() || d.length_squared() == 0.0 {
        return Err(KernelError::invalid(
            field,
            format!("must be a finite non-zero vector, got {v:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    #[test]
    fn radial_altitude_and_up() {
        let space = WorldSpace::radial(1_000.0);
        let p = DVec3::new(0.0, 1_500.0, 0.0);
        assert_eq!(space.altitude_m(p), 500.0);
        assert_eq!(space.up_at(p), DVec3::Y);
        assert_eq!(space.up_at(DVec3::ZERO), DVec3::Z);
    }

    #[test]
    fn axial_altitude_ignores_horizontal_offset() {
        let space = WorldSpace::axial(10.0, [0.0, 0.0, 2.0]);
        let a = space.altitude_m(DVec3::new(0.0, 0.0, 15.0));
        let b = space.altitude_m(DVec3::new(500.0, -300.0, 15.0));
        assert_eq!(a, 5.0);
        assert_eq!(a, b);
        assert_eq!(space.up_at(DVec3::new(1.0, 1.0, 1.0)), DVec3::Z);
    }

    #[test]
    fn point_at_altitude_inverts_altitude() {
        let radial = WorldSpace::radial(6_371_000.0);
        let p = radial.point_at_altitude(DVec3::new(1.0, 1.0, 0.0), 2_500.0);
        assert!((radial.altitude_m(p) - 2_500.0).abs() < 1e-6);

        let axial = WorldSpace::axial(1.0, [0.0, 0.0, 1.0]);
        let p = axial.point_at_altitude(DVec3::new(3.0, 4.0, 99.0), 7.0);
        assert_eq!(p, DVec3::new(3.0, 4.0, 8.0));
        assert!((axial.altitude_m(p) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn radial_point_clamps_at_center() {
        let radial = WorldSpace::radial(6_371_000.0);
        let p = radial.point_at_altitude(DVec3::Z, -7_000_000.0);
        assert_eq!(p, DVec3::ZERO);
        assert_eq!(radial.altitude_m(p), -6_371_000.0);

        let p = radial.point_at_altitude(DVec3::Z, -6_000_000.0);
        assert!((radial.altitude_m(p) + 6_000_000.0).abs() < 1e-6);
    }

    fn rejected_field(d: &WorldEnvDescriptor) -> &'static str {
        match d.validate() {
            Err(KernelError::InvalidDescriptor { field, .. }) => field,
            other => panic!("expected InvalidDescriptor, got {other:?}"),
        }
    }

    #[test]
    fn presets_validate() {
        for name in presets::names() {
            let d = presets::by_name(name).unwrap();
            d.validate().unwrap();
        }
    }

    #[test]
    fn rejects_bad_radius() {
        let mut d = presets::earth_v0();
        d.space.surface_radius_m = 0.0;
        let err = d.validate().unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidDescriptor {
                field: "space.surface_radius_m",
                ..
            }
        ));

        d.space.surface_radius_m = f64::NAN;
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_zero_axis_and_direction() {
        let mut d = presets::habitat_v0();
        d.space.up_model = UpModel::Axial {
            axis: [0.0, 0.0, 0.0],
        };
        assert!(d.validate().is_err());

        let mut d = presets::habitat_v0();
        d.gravity.kind = GravityKind::Uniform {
            direction: [0.0, 0.0, 0.0],
        };
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_negative_gravity() {
        let mut d = presets::moon_v0();
        d.gravity.strength = -1.0;
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_bad_atmosphere() {
        let mut d = presets::earth_v0();
        if let Some(a) = d.atmosphere.as_mut() {
            a.scale_height_m = 0.0;
        }
        assert!(d.validate().is_err());

        let mut d = presets::earth_v0();
        if let Some(a) = d.atmosphere.as_mut() {
            a.max_height_m = Some(-5.0);
        }
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_pressure_without_atmosphere() {
        let mut d = presets::moon_v0();
        d.pressure = Some(PressureModel {
            derive_from_density: true,
        });
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("requires an atmosphere"));

        d.pressure = Some(PressureModel {
            derive_from_density: false,
        });
        d.validate().unwrap();
        assert!(!d.derives_pressure());
    }

    #[test]
    fn rejects_negative_sea_level_density() {
        let mut d = presets::earth_v0();
        if let Some(a) = d.atmosphere.as_mut() {
            a.sea_level_density = -1.0;
        }
        assert_eq!(rejected_field(&d), "atmosphere.sea_level_density");
    }

    #[test]
    fn rejects_bad_temperature() {
        let mut d = presets::earth_v0();
        if let Some(t) = d.temperature.as_mut() {
            t.surface_temp_k = -1.0;
        }
        assert_eq!(rejected_field(&d), "temperature.surface_temp_k");

        let mut d = presets::earth_v0();
        if let Some(t) = d.temperature.as_mut() {
            t.lapse_rate_k_per_m = Some(f64::INFINITY);
        }
        assert_eq!(rejected_field(&d), "temperature.lapse_rate_k_per_m");
    }

    #[test]
    fn rejects_bad_noise() {
        let noise = |amplitude_m, frequency, bias| {
            let mut d = presets::earth_v0();
            d.land = LandModel::Noise {
                amplitude_m,
                frequency,
                bias,
            };
            d
        };
        assert_eq!(rejected_field(&noise(100.0, 0.0, 0.0)), "land.frequency");
        assert_eq!(rejected_field(&noise(-1.0, 0.5, 0.0)), "land.amplitude_m");
        assert_eq!(rejected_field(&noise(100.0, 0.5, f64::NAN)), "land.bias");
        noise(0.0, 0.5, -0.3).validate().unwrap();
    }

    #[test]
    fn optional_models_default_when_missing() {
        let json = r#"{
            "space": { "surface_radius_m": 100.0, "up_model": "Radial" },
            "gravity": { "kind": "None", "strength": 0.0 },
            "medium": { "default": "Vacuum" }
        }"#;
        let d: WorldEnvDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.land, LandModel::Flat);
        assert!(d.atmosphere.is_none());
        assert!(d.temperature.is_none());
        assert!(d.pressure.is_none());
        d.validate().unwrap();
    }

    #[test]
    fn rejects_bad_composition() {
        use crate::chemistry::Species;

        let mut d = presets::earth_v0();
        if let Some(a) = d.atmosphere.as_mut() {
            a.composition = Some(GasComposition::new([(Species::O2, -0.2)]));
        }
        assert_eq!(rejected_field(&d), "atmosphere.composition");

        if let Some(a) = d.atmosphere.as_mut() {
            a.composition = Some(GasComposition::default());
        }
        assert_eq!(rejected_field(&d), "atmosphere.composition");
    }

    #[test]
    fn chemistry_follows_composition() {
        assert!(presets::earth_v0().chemistry().is_some());
        assert!(presets::moon_v0().chemistry().is_none());

        let mut d = presets::earth_v0();
        if let Some(a) = d.atmosphere.as_mut() {
            a.composition = None;
        }
        assert!(d.chemistry().is_none());
        d.validate().unwrap();
    }

    #[test]
    fn layers_by_world() {
        let earth = presets::earth_v0();
        assert_eq!(earth.layer_at(-5.0), AtmosphereLayer::Surface);
        assert_eq!(earth.layer_at(1_000.0), AtmosphereLayer::Troposphere);
        assert_eq!(earth.layer_at(30_000.0), AtmosphereLayer::Stratosphere);
        assert_eq!(earth.layer_at(200_000.0), AtmosphereLayer::Vacuum);

        let moon = presets::moon_v0();
        assert_eq!(moon.layer_at(-5.0), AtmosphereLayer::Surface);
        assert_eq!(moon.layer_at(10.0), AtmosphereLayer::Vacuum);

        let habitat = presets::habitat_v0();
        assert_eq!(habitat.layer_at(2.0), AtmosphereLayer::Troposphere);
        assert_eq!(habitat.layer_at(60.0), AtmosphereLayer::Vacuum);
    }

    #[test]
    fn composition_round_trips_through_json() {
        let json = serde_json::to_string(&presets::earth_v0()).unwrap();
        assert!(json.contains(r#""composition":{"N2":0.78084"#));
        let back: WorldEnvDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, presets::earth_v0());
    }

    #[test]
    fn noise_parameters_default_to_earth_like() {
        let land: LandModel = serde_json::from_str(r#"{ "Noise": {} }"#).unwrap();
        assert_eq!(land, LandModel::earth_like());
    }
}
