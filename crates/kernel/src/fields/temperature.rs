use worldenv_common::SimTime;

use crate::descriptor::TemperatureModel;
use crate::field::{Field, FieldSample, Probe};

/// Linear lapse-rate temperature profile, floored at absolute zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureField {
    pub surface_temp_k: f64,
    pub lapse_rate_k_per_m: Option<f64>,
}

impl TemperatureField {
    pub fn from_model(model: &TemperatureModel) -> Self {
        Self {
            surface_temp_k: model.surface_temp_k,
            lapse_rate_k_per_m: model.lapse_rate_k_per_m,
        }
    }

    /// Below the datum the surface temperature holds.
    pub fn temperature_at_altitude(&self, altitude_m: f64) -> f64 {
        let lapse = self.lapse_rate_k_per_m.unwrap_or(0.0);
        (self.surface_temp_k + lapse * altitude_m.max(0.0)).max(0.0)
    }
}

impl Field for TemperatureField {
    fn name(&self) -> &str {
        "temperature"
    }

    fn sample(&self, probe: &Probe, _time: SimTime) -> FieldSample {
        FieldSample {
            temperature: self.temperature_at_altitude(probe.altitude_m),
            ..Default::default()
        }
    }
}
