//! Built-in fields derived from a `WorldEnvDescriptor`.

mod atmosphere;
mod gravity;
mod land;
mod medium;
mod pressure;
mod temperature;

pub use atmosphere::{AtmosphereField, AtmosphereLayer, classify_layer};
pub use gravity::GravityField;
pub use land::LandField;
pub use medium::MediumField;
pub use pressure::PressureField;
pub use temperature::TemperatureField;
