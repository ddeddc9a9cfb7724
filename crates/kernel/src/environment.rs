use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use worldenv_common::SimTime;

use crate::descriptor::{WorldEnvDescriptor, WorldSpace};
use crate::error::{KernelError, Result};
use crate::field::{Field, FieldSample};
use crate::fields::{
    AtmosphereField, GravityField, LandField, MediumField, PressureField, TemperatureField,
};

/// Upper bound on the samples one sweep may produce.
pub const MAX_SWEEP_SAMPLES: usize = 100_000;

/// A sampled environment at one point and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSample {
    pub position: DVec3,
    pub altitude_m: f64,
    pub up: DVec3,
    pub time: SimTime,
    pub values: FieldSample,
}

/// Runtime environment of a world: its space plus an ordered field stack.
///
/// Fields are ordered global to local. Later fields layer over earlier ones.
#[derive(Debug, Clone)]
pub struct WorldEnvironment {
    pub space: WorldSpace,
    pub fields: Vec<Arc<dyn Field>>,
}

impl WorldEnvironment {
    /// An environment with no fields. Every sample is empty vacuum.
    pub fn new(space: WorldSpace) -> Self {
        Self {
            space,
            fields: Vec::new(),
        }
    }

    /// Build the standard field stack for a descriptor.
    ///
    /// The descriptor is assumed valid; call `validate` first for untrusted input.
    pub fn from_descriptor(descriptor: &WorldEnvDescriptor) -> Self {
        let space = descriptor.space.clone();
        let mut env = Self::new(space.clone());

        env.push_field(GravityField::from_model(&space, &descriptor.gravity));
        env.push_field(LandField::new(descriptor.land.clone()));
        if let Some(atmosphere) = &descriptor.atmosphere {
            env.push_field(AtmosphereField::from_model(atmosphere));
        }
        if let Some(temperature) = &descriptor.temperature {
            env.push_field(TemperatureField::from_model(temperature));
        }
        env.push_field(MediumField::from_descriptor(descriptor));
        if descriptor.derives_pressure() {
            if let Some(atmosphere) = &descriptor.atmosphere {
                env.push_field(PressureField::from_model(atmosphere));
            }
        }

        tracing::debug!(fields = env.fields.len(), "built world environment");
        env
    }

    /// Append a field on top of the stack.
    pub fn push_field(&mut self, field: impl Field + 'static) {
        self.fields.push(Arc::new(field));
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    /// Sample every field at a world-local point.
    pub fn sample(&self, point: DVec3, time: SimTime) -> EnvSample {
        let probe = self.space.probe(point);

        let mut values = self
            .fields
            .iter()
            .fold(FieldSample::default(), |acc, field| {
                acc.merged(field.sample(&probe, time))
            });
        for field in &self.fields {
            let derived = field.derive(&probe, time, &values);
            values.merge(derived);
        }

        EnvSample {
            position: probe.position,
            altitude_m: probe.altitude_m,
            up: probe.up,
            time,
            values,
        }
    }

    /// Sample at an altitude above the surface spot picked by `direction`.
    pub fn sample_at_altitude(&self, direction: DVec3, altitude_m: f64, time: SimTime) -> EnvSample {
        self.sample(self.space.point_at_altitude(direction, altitude_m), time)
    }

    /// Sample a vertical column from `start_m` to `end_m` inclusive.
    pub fn sweep(
        &self,
        direction: DVec3,
        start_m: f64,
        end_m: f64,
        step_m: f64,
        time: SimTime,
    ) -> Result<Vec<EnvSample>> {
        if !step_m.is_finite() || step_m <= 0.0 {
            return Err(KernelError::InvalidSweep(format!(
                "step must be positive, got {step_m}"
            )));
        }
        if !start_m.is_finite() || !end_m.is_finite() || end_m <= start_m {
            return Err(KernelError::InvalidSweep(format!(
                "end ({end_m}) must be above start ({start_m})"
            )));
        }

        let steps = ((end_m - start_m) / step_m).floor();
        if steps >= MAX_SWEEP_SAMPLES as f64 {
            return Err(KernelError::InvalidSweep(format!(
                "{start_m}..{end_m} by {step_m} exceeds {MAX_SWEEP_SAMPLES} samples"
            )));
        }
        let steps = steps as usize;

        let _span = tracing::info_span!("sweep", start_m, end_m, step_m).entered();
        let samples: Vec<EnvSample> = (0..=steps)
            .map(|i| self.sample_at_altitude(direction, start_m + i as f64 * step_m, time))
            .collect();
        tracing::debug!(samples = samples.len(), "sweep complete");
        Ok(samples)
    }
}

impl From<&WorldEnvDescriptor> for WorldEnvironment {
    fn from(descriptor: &WorldEnvDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}
