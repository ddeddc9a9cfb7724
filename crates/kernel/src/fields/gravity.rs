use glam::DVec3;
use worldenv_common::SimTime;

use crate::descriptor::{GravityKind, GravityModel, WorldSpace};
use crate::field::{Field, FieldSample, Probe};

/// Baseline gravity of a world.
///
/// `Radial` treats the world as a uniform sphere of the reference radius:
/// inverse square outside, linear inside.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityField {
    pub kind: GravityKind,
    pub strength: f64,
    pub surface_radius_m: f64,
}

impl GravityField {
    pub fn from_model(space: &WorldSpace, model: &GravityModel) -> Self {
        Self {
            kind: model.kind.clone(),
            strength: model.strength,
            surface_radius_m: space.surface_radius_m,
        }
    }

    /// Acceleration vector at a world-local point.
    pub fn acceleration_at(&self, position: DVec3) -> DVec3 {
        match &self.kind {
            GravityKind::None => DVec3::ZERO,
            GravityKind::Uniform { direction } => {
                DVec3::from_array(*direction).normalize_or_zero() * self.strength
            }
            GravityKind::Radial => {
                let r = position.length();
                if r == 0.0 {
                    return DVec3::ZERO;
                }
                let surface = self.surface_radius_m;
                let magnitude = if r >= surface {
                    self.strength * (surface / r).powi(2)
                } else {
                    self.strength * r / surface
                };
                -position / r * magnitude
            }
        }
    }
}

impl Field for GravityField {
    fn name(&self) -> &str {
        "gravity"
    }

    fn sample(&self, probe: &Probe, _time: SimTime) -> FieldSample {
        let gravity = self.acceleration_at(probe.position);
        FieldSample {
            gravity,
            gravity_radial: -gravity.dot(probe.up),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f64 = 1_000.0;

    fn radial() -> GravityField {
        GravityField {
            kind: GravityKind::Radial,
            strength: 10.0,
            surface_radius_m: R,
        }
    }

    #[test]
    fn radial_follows_inverse_square() {
        let g = radial();
        let at_surface = g.acceleration_at(DVec3::new(R, 0.0, 0.0));
        assert!((at_surface - DVec3::new(-10.0, 0.0, 0.0)).length() < 1e-12);

        let at_double = g.acceleration_at(DVec3::new(0.0, 2.0 * R, 0.0));
        assert!((at_double.length() - 2.5).abs() < 1e-12);
        assert!(at_double.y < 0.0);
    }

    #[test]
    fn radial_is_linear_inside() {
        let g = radial();
        let half = g.acceleration_at(DVec3::new(0.0, 0.0, R / 2.0));
        assert!((half.length() - 5.0).abs() < 1e-12);
        assert_eq!(g.acceleration_at(DVec3::ZERO), DVec3::ZERO);
    }

    #[test]
    fn uniform_is_constant() {
        let g = GravityField {
            kind: GravityKind::Uniform {
                direction: [0.0, 0.0, -3.0],
            },
            strength: 9.81,
            surface_radius_m: R,
        };
        let a = g.acceleration_at(DVec3::new(1.0, 2.0, 3.0));
        let b = g.acceleration_at(DVec3::new(-500.0, 7.0, 1e6));
        assert_eq!(a, b);
        assert!((a.z + 9.81).abs() < 1e-12);
    }

    #[test]
    fn none_is_zero() {
        let g = GravityField {
            kind: GravityKind::None,
            strength: 9.81,
            surface_radius_m: R,
        };
        assert_eq!(g.acceleration_at(DVec3::new(R, 0.0, 0.0)), DVec3::ZERO);
    }

    #[test]
    fn radial_component_points_down() {
        let space = WorldSpace::radial(R);
        let g = radial();
        let probe = space.probe(DVec3::new(0.0, R, 0.0));
        let s = g.sample(&probe, SimTime::ZERO);
        assert!((s.gravity_radial - 10.0).abs() < 1e-12);
    }
}
