use worldenv_common::WorldId;

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("invalid descriptor: {field} {reason}")]
    InvalidDescriptor { field: &'static str, reason: String },
    #[error("world {0} not found")]
    WorldNotFound(WorldId),
    #[error("world {0} is already registered")]
    DuplicateWorld(WorldId),
    #[error("world {world} names unknown parent {parent}")]
    UnknownParent { world: WorldId, parent: WorldId },
    #[error("making {parent} the parent of {world} would create a cycle")]
    ParentCycle { world: WorldId, parent: WorldId },
    #[error("world {world} still has {children} child world(s)")]
    HasChildren { world: WorldId, children: usize },
    #[error("no frame registered for world {0}")]
    MissingFrame(WorldId),
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
}

impl KernelError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;
