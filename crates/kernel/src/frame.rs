//! Frames place each world relative to its parent over time.
//!
//! Orbits are circular and expressed in the parent's non-rotating frame, so a
//! world's origin in the root frame is the sum of frame offsets up the parent
//! chain. Spin only affects points given in world-local coordinates.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;
use worldenv_common::{SimDuration, SimTime, WorldId};

use crate::error::{KernelError, Result};
use crate::world::WorldRegistry;

/// Circular orbit plus optional spin about a tilted axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalParams {
    pub semi_major_axis_m: f64,
    pub period: SimDuration,
    #[serde(default)]
    pub inclination_rad: f64,
    #[serde(default)]
    pub phase_at_epoch: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_period: Option<SimDuration>,
    #[serde(default)]
    pub rotation_phase_at_epoch: f64,
    #[serde(default)]
    pub axial_tilt_rad: f64,
}

impl OrbitalParams {
    fn orbit_angle(&self, elapsed: SimDuration) -> f64 {
        let period = self.period.as_secs_f64();
        if period == 0.0 {
            return self.phase_at_epoch;
        }
        TAU * (elapsed.as_secs_f64() / period).rem_euclid(1.0) + self.phase_at_epoch
    }

    /// Offset from the parent origin after `elapsed` world-local time.
    pub fn position_at(&self, elapsed: SimDuration) -> DVec3 {
        let theta = self.orbit_angle(elapsed);
        let flat = DVec3::new(theta.cos(), theta.sin(), 0.0) * self.semi_major_axis_m;
        DQuat::from_rotation_x(self.inclination_rad) * flat
    }

    /// Body orientation: spin about +Z, then the spin axis tilted about X.
    pub fn orientation_at(&self, elapsed: SimDuration) -> DQuat {
        let spin = match self.rotation_period {
            Some(period) if period.as_ns() != 0 => {
                TAU * (elapsed.as_secs_f64() / period.as_secs_f64()).rem_euclid(1.0)
                    + self.rotation_phase_at_epoch
            }
            _ => self.rotation_phase_at_epoch,
        };
        DQuat::from_rotation_x(self.axial_tilt_rad) * DQuat::from_rotation_z(spin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameModel {
    /// Fixed offset from the parent origin.
    Static { position: [f64; 3] },
    Orbital { params: OrbitalParams },
}

impl FrameModel {
    pub fn position_at(&self, elapsed: SimDuration) -> DVec3 {
        match self {
            FrameModel::Static { position } => DVec3::from_array(*position),
            FrameModel::Orbital { params } => params.position_at(elapsed),
        }
    }

    pub fn orientation_at(&self, elapsed: SimDuration) -> DQuat {
        match self {
            FrameModel::Static { .. } => DQuat::IDENTITY,
            FrameModel::Orbital { params } => params.orientation_at(elapsed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldFrame {
    pub world_id: WorldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_radius_m: Option<f64>,
    pub model: FrameModel,
}

/// Frames keyed by world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSet {
    frames: BTreeMap<WorldId, WorldFrame>,
}

impl FrameSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the frame for `frame.world_id`.
    pub fn insert(&mut self, frame: WorldFrame) -> Option<WorldFrame> {
        self.frames.insert(frame.world_id, frame)
    }

    /// Drop the frame for a world, returning it if present.
    pub fn remove(&mut self, id: WorldId) -> Option<WorldFrame> {
        self.frames.remove(&id)
    }

    /// Frame of a world, if one is registered.
    pub fn get(&self, id: WorldId) -> Option<&WorldFrame> {
        self.frames.get(&id)
    }

    /// Number of worlds with a frame.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in world id order.
    pub fn iter(&self) -> impl Iterator<Item = &WorldFrame> {
        self.frames.values()
    }
}

/// Resolves world positions in the root frame of a registry's world tree.
#[derive(Debug, Clone, Copy)]
pub struct WorldResolver<'a> {
    registry: &'a WorldRegistry,
    frames: &'a FrameSet,
}

impl<'a> WorldResolver<'a> {
    /// Borrow a registry for the world tree and a frame set for the motion.
    pub fn new(registry: &'a WorldRegistry, frames: &'a FrameSet) -> Self {
        Self { registry, frames }
    }

    fn frame(&self, id: WorldId) -> Result<&'a WorldFrame> {
        self.frames.get(id).ok_or(KernelError::MissingFrame(id))
    }

    fn elapsed(&self, id: WorldId, time: SimTime) -> Result<SimDuration> {
        self.registry
            .get(id)
            .map(|w| w.local_time(time))
            .ok_or(KernelError::WorldNotFound(id))
    }

    /// Origin of a world in the root frame at global `time`.
    pub fn world_origin(&self, id: WorldId, time: SimTime) -> Result<DVec3> {
        let mut origin = DVec3::ZERO;
        let chain = std::iter::once(id).chain(self.registry.ancestors(id)?);
        for world in chain {
            let elapsed = self.elapsed(world, time)?;
            origin += self.frame(world)?.model.position_at(elapsed);
        }
        Ok(origin)
    }

    /// A world-local point expressed in the root frame.
    pub fn world_point(&self, id: WorldId, local: DVec3, time: SimTime) -> Result<DVec3> {
        let origin = self.world_origin(id, time)?;
        let elapsed = self.elapsed(id, time)?;
        let rotation = self.frame(id)?.model.orientation_at(elapsed);
        Ok(origin + rotation * local)
    }

    /// Vector from a point on `from` to the origin of `to`, in the root frame.
    pub fn vector_between(
        &self,
        from: WorldId,
        from_local: DVec3,
        to: WorldId,
        time: SimTime,
    ) -> Result<DVec3> {
        Ok(self.world_origin(to, time)? - self.world_point(from, from_local, time)?)
    }
}
