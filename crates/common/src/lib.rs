//! Shared types used across the worldenv crates.

mod time;
mod types;

pub use time::{SimDuration, SimTime};
pub use types::WorldId;
