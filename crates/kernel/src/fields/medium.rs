use worldenv_common::SimTime;

use crate::descriptor::{Medium, WorldEnvDescriptor};
use crate::field::{Field, FieldSample, Probe};

/// Classifies the medium at a point. Runs in the derive pass because it needs
/// the merged land height.
#[derive(Debug, Clone, PartialEq)]
pub struct MediumField {
    pub default: Medium,
    /// Altitude above which the world is vacuum. `None` when the atmosphere is
    /// unbounded or absent.
    pub atmosphere_limit_m: Option<f64>,
}

impl MediumField {
    pub fn from_descriptor(descriptor: &WorldEnvDescriptor) -> Self {
        Self {
            default: descriptor.medium.default,
            atmosphere_limit_m: descriptor
                .atmosphere
                .as_ref()
                .and_then(|a| a.max_height_m),
        }
    }

    pub fn classify(&self, altitude_m: f64, land_height_m: f64) -> Medium {
        if altitude_m < land_height_m {
            Medium::Solid
        } else if altitude_m < 0.0 && self.default.is_fluid() {
            Medium::Liquid
        } else if self.atmosphere_limit_m.is_some_and(|limit| altitude_m > limit) {
            Medium::Vacuum
        } else {
            self.default
        }
    }
}

impl Field for MediumField {
    fn name(&self) -> &str {
        "medium"
    }

    fn derive(&self, probe: &Probe, _time: SimTime, env: &FieldSample) -> FieldSample {
        FieldSample {
            medium: self.classify(probe.altitude_m, env.land_height_m),
            ..Default::default()
        }
    }
}
