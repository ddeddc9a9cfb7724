//! The field layer model.
//!
//! An environment is an ordered stack of fields. Sampling runs two passes:
//! every field's `sample` is merged into an empty `FieldSample`, then every
//! field's `derive` is merged in order, each seeing what has accumulated so far.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use worldenv_common::SimTime;

use crate::descriptor::Medium;

/// A point in world-local coordinates with its precomputed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub position: DVec3,
    /// Unit "up" at `position`.
    pub up: DVec3,
    /// Distance from the world origin.
    pub radius_m: f64,
    /// Height above the reference surface.
    pub altitude_m: f64,
    /// Horizontal surface coordinates, one unit per surface radius.
    pub surface: DVec3,
}

/// Values contributed by one field, or the merged result of a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    pub medium: Medium,
    /// kg/m³
    pub density: f64,
    /// Pa
    pub pressure: f64,
    /// K
    pub temperature: f64,
    /// Acceleration vector (m/s²).
    pub gravity: DVec3,
    /// Component of `gravity` pointing down (m/s²).
    pub gravity_radial: f64,
    /// Vertical wind (m/s, positive up).
    ///
    /// No built-in field writes this or `resistance`. Fields pushed onto a
    /// `WorldEnvironment` at runtime fill them, and they stay zero otherwise.
    pub wind_radial: f64,
    /// Drag-like scalar, runtime fields only.
    pub resistance: f64,
    /// Height of the solid surface above the datum (m).
    pub land_height_m: f64,
}

impl Default for FieldSample {
    fn default() -> Self {
        Self {
            medium: Medium::Vacuum,
            density: 0.0,
            pressure: 0.0,
            temperature: 0.0,
            gravity: DVec3::ZERO,
            gravity_radial: 0.0,
            wind_radial: 0.0,
            resistance: 0.0,
            land_height_m: 0.0,
        }
    }
}

impl FieldSample {
    /// Layer `other` on top of `self`.
    ///
    /// A non-vacuum medium replaces the current one; every numeric quantity adds.
    pub fn merge(&mut self, other: FieldSample) {
        if other.medium != Medium::Vacuum {
            self.medium = other.medium;
        }
        self.density += other.density;
        self.pressure += other.pressure;
        self.temperature += other.temperature;
        self.gravity += other.gravity;
        self.gravity_radial += other.gravity_radial;
        self.wind_radial += other.wind_radial;
        self.resistance += other.resistance;
        self.land_height_m += other.land_height_m;
    }

    pub fn merged(mut self, other: FieldSample) -> Self {
        self.merge(other);
        self
    }
}

/// One layer of a world environment.
pub trait Field: Debug + Send + Sync {
    /// Short label used in logs and listings.
    fn name(&self) -> &str;

    /// Contribution that depends only on position and time.
    fn sample(&self, _probe: &Probe, _time: SimTime) -> FieldSample {
        FieldSample::default()
    }

    /// Contribution that depends on what earlier layers produced.
    fn derive(&self, _probe: &Probe, _time: SimTime, _env: &FieldSample) -> FieldSample {
        FieldSample::default()
    }
}
