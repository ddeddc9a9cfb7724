use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use worldenv_common::WorldId;
use worldenv_kernel::{World, WorldEnvDescriptor};

use crate::catalog::CatalogError;

/// On-disk encoding for world files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    #[default]
    Json,
    Yaml,
}

impl CatalogFormat {
    pub fn extension(self) -> &'static str {
        match self {
            CatalogFormat::Json => "json",
            CatalogFormat::Yaml => "yaml",
        }
    }

    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, CatalogError> {
        Ok(match self {
            CatalogFormat::Json => serde_json::to_vec_pretty(value)?,
            CatalogFormat::Yaml => serde_yaml::to_string(value)?.into_bytes(),
        })
    }

    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T, CatalogError> {
        Ok(match self {
            CatalogFormat::Json => serde_json::from_slice(data)?,
            CatalogFormat::Yaml => serde_yaml::from_slice(data)?,
        })
    }
}

impl FromStr for CatalogFormat {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(CatalogFormat::Json),
            "yaml" | "yml" => Ok(CatalogFormat::Yaml),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Read a world from a standalone JSON or YAML file and validate it.
///
/// A file holding only an environment descriptor is accepted too; it becomes
/// world 0 named after the file stem.
pub fn read_world_file(path: impl AsRef<Path>) -> Result<World, CatalogError> {
    let path = path.as_ref();
    let format = CatalogFormat::from_path(path)?;
    let data = std::fs::read(path)?;

    let world = match format.decode::<World>(&data) {
        Ok(world) => world,
        Err(world_err) => match format.decode::<WorldEnvDescriptor>(&data) {
            Ok(descriptor) => {
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("world");
                World::new(WorldId(0), name, descriptor)
            }
            Err(_) => return Err(world_err),
        },
    };
    world.environment.validate()?;
    Ok(world)
}

/// Write a world to a standalone file, choosing the format from the extension.
pub fn write_world_file(path: impl AsRef<Path>, world: &World) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let format = CatalogFormat::from_path(path)?;
    std::fs::write(path, format.encode(world)?)?;
    Ok(())
}
