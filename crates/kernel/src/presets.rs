//! Built-in world descriptors and the Sun/Earth/Moon frame hierarchy.

use worldenv_common::{SimDuration, WorldId};

use crate::chemistry::GasComposition;
use crate::descriptor::*;
use crate::frame::{FrameModel, FrameSet, OrbitalParams, WorldFrame};
use crate::world::{World, WorldRegistry};
use crate::Result;

pub const SUN: WorldId = WorldId(0);
pub const EARTH: WorldId = WorldId(1);
pub const MOON: WorldId = WorldId(2);

const PRESET_NAMES: [&str; 4] = ["earth", "moon", "habitat", "sun"];

pub fn names() -> &'static [&'static str] {
    &PRESET_NAMES
}

/// Look up a preset descriptor by name (case-insensitive).
pub fn by_name(name: &str) -> Option<WorldEnvDescriptor> {
    match name.to_ascii_lowercase().as_str() {
        "earth" | "earth_v0" => Some(earth_v0()),
        "moon" | "moon_v0" => Some(moon_v0()),
        "habitat" | "habitat_v0" => Some(habitat_v0()),
        "sun" | "sun_v0" => Some(sun_v0()),
        _ => None,
    }
}

pub fn earth_v0() -> WorldEnvDescriptor {
    WorldEnvDescriptor {
        space: WorldSpace {
            // Mean Earth radius
            surface_radius_m: 6_371_000.0,
            up_model: UpModel::Radial,
        },
        gravity: GravityModel {
            kind: GravityKind::Radial,
            strength: 9.80665,
        },
        medium: MediumModel {
            default: Medium::Gas,
        },
        land: LandModel::earth_like(),
        atmosphere: Some(AtmosphereModel {
            sea_level_density: 1.225,
            scale_height_m: 8_500.0,
            max_height_m: Some(120_000.0),
            composition: Some(GasComposition::earth_like()),
        }),
        temperature: Some(TemperatureModel {
            surface_temp_k: 288.15,
            lapse_rate_k_per_m: Some(-0.0065),
        }),
        pressure: Some(PressureModel {
            derive_from_density: true,
        }),
    }
}

pub fn moon_v0() -> WorldEnvDescriptor {
    WorldEnvDescriptor {
        space: WorldSpace::radial(1_737_400.0),
        gravity: GravityModel {
            kind: GravityKind::Radial,
            strength: 1.62,
        },
        medium: MediumModel {
            default: Medium::Vacuum,
        },
        land: LandModel::Flat,
        atmosphere: None,
        temperature: Some(TemperatureModel {
            surface_temp_k: 250.0,
            lapse_rate_k_per_m: None,
        }),
        pressure: None,
    }
}

/// A rotating habitat deck: fixed up axis, uniform spin gravity, shallow air.
pub fn habitat_v0() -> WorldEnvDescriptor {
    WorldEnvDescriptor {
        space: WorldSpace::axial(1.0, [0.0, 0.0, 1.0]),
        gravity: GravityModel {
            kind: GravityKind::Uniform {
                direction: [0.0, 0.0, -1.0],
            },
            strength: 9.81,
        },
        medium: MediumModel {
            default: Medium::Gas,
        },
        land: LandModel::Flat,
        atmosphere: Some(AtmosphereModel {
            sea_level_density: 1.2,
            scale_height_m: 8_400.0,
            max_height_m: Some(50.0),
            composition: Some(GasComposition::earth_like()),
        }),
        temperature: Some(TemperatureModel {
            surface_temp_k: 293.15,
            lapse_rate_k_per_m: None,
        }),
        pressure: Some(PressureModel {
            derive_from_density: true,
        }),
    }
}

/// The Sun as a world: only its gravity matters here.
pub fn sun_v0() -> WorldEnvDescriptor {
    WorldEnvDescriptor {
        space: WorldSpace::radial(696_340_000.0),
        gravity: GravityModel {
            kind: GravityKind::Radial,
            strength: 274.0,
        },
        medium: MediumModel {
            default: Medium::Gas,
        },
        land: LandModel::Flat,
        atmosphere: None,
        temperature: Some(TemperatureModel {
            surface_temp_k: 5_772.0,
            lapse_rate_k_per_m: None,
        }),
        pressure: None,
    }
}

/// Registry holding Sun (0), Earth (1, parent Sun) and Moon (2, parent Earth).
pub fn solar_system() -> Result<WorldRegistry> {
    let mut registry = WorldRegistry::new();
    registry.register(World::new(SUN, "Sun", sun_v0()))?;
    registry.register(
        World::new(EARTH, "Earth", earth_v0())
            .with_parent(SUN)
            .with_description("Reference terrestrial world"),
    )?;
    registry.register(World::new(MOON, "Moon", moon_v0()).with_parent(EARTH))?;
    Ok(registry)
}

/// Frames matching `solar_system`.
pub fn frame_presets() -> FrameSet {
    let mut frames = FrameSet::new();

    frames.insert(WorldFrame {
        world_id: SUN,
        physical_radius_m: Some(696_340_000.0),
        model: FrameModel::Static {
            position: [0.0, 0.0, 0.0],
        },
    });

    frames.insert(WorldFrame {
        world_id: EARTH,
        physical_radius_m: Some(6_371_000.0),
        model: FrameModel::Orbital {
            params: OrbitalParams {
                semi_major_axis_m: 149_597_870_700.0,
                period: SimDuration::years(1),
                inclination_rad: 0.0,
                phase_at_epoch: std::f64::consts::PI,
                rotation_period: Some(SimDuration::seconds(86_164)),
                rotation_phase_at_epoch: std::f64::consts::PI,
                axial_tilt_rad: 0.409_092_8,
            },
        },
    });

    frames.insert(WorldFrame {
        world_id: MOON,
        physical_radius_m: Some(1_737_400.0),
        model: FrameModel::Orbital {
            params: OrbitalParams {
                semi_major_axis_m: 384_400_000.0,
                period: SimDuration::days_f64(27.321_66),
                inclination_rad: 0.089,
                phase_at_epoch: 4.44,
                rotation_period: Some(SimDuration::days_f64(27.321_66)),
                rotation_phase_at_epoch: 0.0,
                axial_tilt_rad: 0.0269,
            },
        },
    });

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(by_name("Earth"), Some(earth_v0()));
        assert_eq!(by_name("moon_v0"), Some(moon_v0()));
        assert!(by_name("mars").is_none());
        for name in names() {
            assert!(by_name(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn solar_system_tree() {
        let registry = solar_system().unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.root_of(MOON).unwrap(), SUN);
        assert_eq!(registry.children(SUN), vec![EARTH]);
        assert_eq!(registry.depth(MOON).unwrap(), 2);
    }

    #[test]
    fn frames_cover_every_world() {
        let registry = solar_system().unwrap();
        let frames = frame_presets();
        for id in registry.worlds().keys() {
            assert!(frames.get(*id).is_some(), "no frame for {id}");
        }
    }
}
