use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a world in the registry and in frame sets.
///
/// Ids are small stable integers (Sun = 0, Earth = 1, ...) so they can appear
/// in file names and on the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorldId(pub u64);

impl WorldId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for WorldId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
