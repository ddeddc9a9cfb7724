//! World Kernel: world records, environment descriptors, and environment sampling.
//!
//! # Invariants
//! - Every descriptor stored in a registry has passed `WorldEnvDescriptor::validate`.
//! - The parent relation between worlds is a forest; cycles are rejected.
//! - Sampling is pure: the same point and time always yield the same sample.
//! - All registry mutations flow through explicit operations and are logged.

pub mod chemistry;
pub mod descriptor;
pub mod environment;
pub mod error;
pub mod field;
pub mod fields;
pub mod frame;
pub mod presets;
pub mod world;

pub use chemistry::{AtmosphereChemistry, ChemistrySample, GasComposition, Species};
pub use descriptor::{
    AtmosphereModel, GravityKind, GravityModel, LandModel, Medium, MediumModel, PressureModel,
    TemperatureModel, UpModel, WorldEnvDescriptor, WorldSpace,
};
pub use environment::{EnvSample, MAX_SWEEP_SAMPLES, WorldEnvironment};
pub use error::{KernelError, Result};
pub use field::{Field, FieldSample, Probe};
pub use fields::{AtmosphereLayer, classify_layer};
pub use frame::{FrameModel, FrameSet, OrbitalParams, WorldFrame, WorldResolver};
pub use world::{World, WorldEvent, WorldRegistry, WorldSummary};
