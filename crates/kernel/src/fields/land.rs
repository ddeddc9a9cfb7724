use glam::DVec3;
use worldenv_common::SimTime;

use crate::descriptor::LandModel;
use crate::field::{Field, FieldSample, Probe};

/// Height of the solid surface relative to the datum.
#[derive(Debug, Clone, PartialEq)]
pub struct LandField {
    pub model: LandModel,
}

impl LandField {
    pub fn new(model: LandModel) -> Self {
        Self { model }
    }

    /// Land height at horizontal surface coordinates (see `WorldSpace::surface_coords`).
    pub fn height_at(&self, surface: DVec3) -> f64 {
        match &self.model {
            LandModel::Flat => 0.0,
            LandModel::Noise {
                amplitude_m,
                frequency,
                bias,
            } => {
                let p = surface * *frequency;
                let n = hash_noise(p);
                (n + bias).clamp(-1.0, 1.0) * amplitude_m
            }
        }
    }
}

/// Deterministic hash noise in [-1, 1).
fn hash_noise(p: DVec3) -> f64 {
    let n = (p.x * 12.9898 + p.y * 78.233 + p.z * 37.719).sin() * 43_758.5453;
    n.rem_euclid(1.0) * 2.0 - 1.0
}

impl Field for LandField {
    fn name(&self) -> &str {
        "land"
    }

    fn sample(&self, probe: &Probe, _time: SimTime) -> FieldSample {
        FieldSample {
            land_height_m: self.height_at(probe.surface),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_is_zero() {
        let land = LandField::new(LandModel::Flat);
        assert_eq!(land.height_at(DVec3::new(0.3, 0.4, 0.5)), 0.0);
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let land = LandField::new(LandModel::earth_like());
        for i in 0..200 {
            let t = i as f64 * 0.137;
            let dir = DVec3::new(t.cos(), t.sin(), (t * 0.5).sin()).normalize();
            let h = land.height_at(dir);
            assert_eq!(h, land.height_at(dir));
            assert!((-4_000.0..=4_000.0).contains(&h), "height {h} out of range");
        }
    }

    #[test]
    fn noise_varies_over_surface() {
        let land = LandField::new(LandModel::Noise {
            amplitude_m: 1_000.0,
            frequency: 1.0,
            bias: 0.0,
        });
        let heights: Vec<f64> = (0..16)
            .map(|i| {
                let a = i as f64 * 0.4;
                land.height_at(DVec3::new(a.cos(), a.sin(), 0.0))
            })
            .collect();
        let first = heights[0];
        assert!(heights.iter().any(|h| (h - first).abs() > 1.0));
    }
}
