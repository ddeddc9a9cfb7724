//! Persistence: a directory catalog of world files with an integrity manifest.
//!
//! # Invariants
//! - Every world written to a catalog has a valid descriptor.
//! - Every tracked file's sha256 is recorded in the manifest; loads fail closed
//!   on mismatch.
//! - A catalog with a different schema version refuses to open.

pub mod catalog;
pub mod format;

pub use catalog::{
    CATALOG_SCHEMA_VERSION, CatalogError, CatalogMeta, IntegrityManifest, ManifestEntry,
    WorldCatalog,
};
pub use format::{CatalogFormat, read_world_file, write_world_file};
