//! File-backed world catalog.
//!
//! Layout inside the catalog directory:
//! ```text
//! catalog.meta.json          - schema version, world count, file format
//! worlds/
//!   world_<id>.json          - one World per file (or .yaml)
//! frames.json                - optional FrameSet
//! integrity/
//!   manifest.json            - sha256 of every world and frames file
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use worldenv_common::WorldId;
use worldenv_kernel::{FrameSet, KernelError, World, WorldRegistry};

use crate::format::{CatalogFormat, read_world_file};

/// Current catalog schema version.
pub const CATALOG_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "catalog.meta.json";
const FRAMES_FILE: &str = "frames.json";
const WORLDS_DIR: &str = "worlds";
const INTEGRITY_DIR: &str = "integrity";
const MANIFEST_FILE: &str = "manifest.json";

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error("integrity check failed for {file}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("world {0} not found in catalog")]
    WorldNotFound(WorldId),
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),
}

/// Metadata stored in catalog.meta.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMeta {
    pub schema_version: u32,
    pub world_count: usize,
    #[serde(default)]
    pub format: CatalogFormat,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the catalog root, with `/` separators.
    pub filename: String,
    pub sha256: String,
}

/// Hashes of every catalog data file, sorted by filename.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

impl IntegrityManifest {
    pub fn get(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    fn record(&mut self, filename: String, sha256: String) {
        match self.entries.binary_search_by(|e| e.filename.as_str().cmp(&filename)) {
            Ok(i) => self.entries[i].sha256 = sha256,
            Err(i) => self.entries.insert(i, ManifestEntry { filename, sha256 }),
        }
    }

    fn forget(&mut self, filename: &str) {
        self.entries.retain(|e| e.filename != filename);
    }
}

/// A directory of world files with schema versioning and integrity checking.
#[derive(Debug)]
pub struct WorldCatalog {
    root: PathBuf,
    meta: CatalogMeta,
    manifest: IntegrityManifest,
}

impl WorldCatalog {
    /// Open or create a JSON catalog at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::open_with_format(path, CatalogFormat::Json)
    }

    /// Open a catalog, creating it with `format` if it does not exist yet.
    ///
    /// An existing catalog keeps the format recorded in its metadata.
    pub fn open_with_format(
        path: impl AsRef<Path>,
        format: CatalogFormat,
    ) -> Result<Self, CatalogError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(WORLDS_DIR))?;
        std::fs::create_dir_all(root.join(INTEGRITY_DIR))?;

        let meta_path = root.join(META_FILE);
        let manifest_path = root.join(INTEGRITY_DIR).join(MANIFEST_FILE);

        let catalog = if meta_path.exists() {
            let meta: CatalogMeta = serde_json::from_slice(&std::fs::read(&meta_path)?)?;
            if meta.schema_version != CATALOG_SCHEMA_VERSION {
                return Err(CatalogError::SchemaMismatch {
                    file_version: meta.schema_version,
                    expected_version: CATALOG_SCHEMA_VERSION,
                });
            }
            let manifest = if manifest_path.exists() {
                serde_json::from_slice(&std::fs::read(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            Self {
                root,
                meta,
                manifest,
            }
        } else {
            let catalog = Self {
                root,
                meta: CatalogMeta {
                    schema_version: CATALOG_SCHEMA_VERSION,
                    world_count: 0,
                    format,
                },
                manifest: IntegrityManifest::default(),
            };
            catalog.save_meta()?;
            catalog.save_manifest()?;
            tracing::debug!(root = %catalog.root.display(), %format, "created catalog");
            catalog
        };
        Ok(catalog)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &CatalogMeta {
        &self.meta
    }

    pub fn manifest(&self) -> &IntegrityManifest {
        &self.manifest
    }

    fn world_filename(&self, id: WorldId) -> String {
        format!("{WORLDS_DIR}/world_{}.{}", id, self.meta.format.extension())
    }

    /// Existing file for a world in either format, preferring the catalog's own.
    fn find_world_file(&self, id: WorldId) -> Option<String> {
        let preferred = self.world_filename(id);
        if self.root.join(&preferred).exists() {
            return Some(preferred);
        }
        self.existing_world_files(id).into_iter().next()
    }

    /// Every file on disk for a world, one per format.
    fn existing_world_files(&self, id: WorldId) -> Vec<String> {
        [CatalogFormat::Json, CatalogFormat::Yaml]
            .into_iter()
            .map(|f| format!("{WORLDS_DIR}/world_{}.{}", id, f.extension()))
            .filter(|name| self.root.join(name).exists())
            .collect()
    }

    /// Write one world, replacing any previous file for the same id.
    pub fn save_world(&mut self, world: &World) -> Result<PathBuf, CatalogError> {
        world.environment.validate()?;
        let filename = self.world_filename(world.id);
        let data = self.meta.format.encode(world)?;
        self.write_tracked(&filename, &data)?;
        tracing::debug!(id = %world.id, file = %filename, "saved world");
        self.refresh_count()?;
        Ok(self.root.join(filename))
    }

    /// Read one world, checking its hash against the manifest first.
    pub fn load_world(&self, id: WorldId) -> Result<World, CatalogError> {
        let filename = self
            .find_world_file(id)
            .ok_or(CatalogError::WorldNotFound(id))?;
        self.verify_file(&filename)?;
        let world = read_world_file(self.root.join(&filename))?;
        if world.id != id {
            return Err(CatalogError::WorldNotFound(id));
        }
        Ok(world)
    }

    /// Remove a world's files in every format and drop them from the manifest.
    pub fn delete_world(&mut self, id: WorldId) -> Result<(), CatalogError> {
        let filenames = self.existing_world_files(id);
        if filenames.is_empty() {
            return Err(CatalogError::WorldNotFound(id));
        }
        for filename in &filenames {
            std::fs::remove_file(self.root.join(filename))?;
            self.manifest.forget(filename);
        }
        self.save_manifest()?;
        tracing::debug!(%id, files = filenames.len(), "deleted world");
        self.refresh_count()
    }

    /// Ids of every world file in the catalog, ascending.
    pub fn list(&self) -> Result<Vec<WorldId>, CatalogError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(self.root.join(WORLDS_DIR))? {
            let path = entry?.path();
            match parse_world_filename(&path) {
                Some(id) => ids.push(id),
                None => tracing::warn!(path = %path.display(), "skipping unrecognized file"),
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Write every world in the registry.
    pub fn save_registry(&mut self, registry: &WorldRegistry) -> Result<(), CatalogError> {
        let _span = tracing::info_span!("save_registry", worlds = registry.len()).entered();
        for world in registry.worlds().values() {
            self.save_world(world)?;
        }
        Ok(())
    }

    /// Rebuild a registry from every world file, registering parents first.
    pub fn load_registry(&self) -> Result<WorldRegistry, CatalogError> {
        let _span = tracing::info_span!("load_registry", root = %self.root.display()).entered();
        let mut pending = self
            .list()?
            .into_iter()
            .map(|id| self.load_world(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut registry = WorldRegistry::new();
        while !pending.is_empty() {
            let (ready, waiting): (Vec<World>, Vec<World>) = pending
                .into_iter()
                .partition(|w| w.parent.is_none_or(|p| registry.contains(p)));
            if ready.is_empty() {
                // Remaining worlds reference parents that never load.
                let orphan = &waiting[0];
                return Err(KernelError::UnknownParent {
                    world: orphan.id,
                    parent: orphan.parent.unwrap_or(orphan.id),
                }
                .into());
            }
            for world in ready {
                registry.register(world)?;
            }
            pending = waiting;
        }
        registry.drain_events();
        tracing::debug!(worlds = registry.len(), "loaded registry");
        Ok(registry)
    }

    pub fn save_frames(&mut self, frames: &FrameSet) -> Result<(), CatalogError> {
        let data = serde_json::to_vec_pretty(frames)?;
        self.write_tracked(FRAMES_FILE, &data)?;
        tracing::debug!(frames = frames.len(), "saved frames");
        Ok(())
    }

    /// The stored frame set, or `None` when the catalog has none.
    pub fn load_frames(&self) -> Result<Option<FrameSet>, CatalogError> {
        if !self.root.join(FRAMES_FILE).exists() {
            return Ok(None);
        }
        self.verify_file(FRAMES_FILE)?;
        let data = std::fs::read(self.root.join(FRAMES_FILE))?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Check every manifest entry against the file on disk.
    pub fn verify_integrity(&self) -> Result<(), CatalogError> {
        for entry in &self.manifest.entries {
            self.verify_file(&entry.filename)?;
        }
        Ok(())
    }

    fn verify_file(&self, filename: &str) -> Result<(), CatalogError> {
        let Some(entry) = self.manifest.get(filename) else {
            tracing::warn!(file = filename, "file not tracked in manifest");
            return Ok(());
        };
        let actual = sha256_hex(&std::fs::read(self.root.join(filename))?);
        if actual != entry.sha256 {
            return Err(CatalogError::IntegrityMismatch {
                file: filename.to_string(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn write_tracked(&mut self, filename: &str, data: &[u8]) -> Result<(), CatalogError> {
        std::fs::write(self.root.join(filename), data)?;
        self.manifest
            .record(filename.to_string(), sha256_hex(data));
        self.save_manifest()
    }

    fn refresh_count(&mut self) -> Result<(), CatalogError> {
        self.meta.world_count = self.list()?.len();
        self.save_meta()
    }

    fn save_meta(&self) -> Result<(), CatalogError> {
        let path = self.root.join(META_FILE);
        std::fs::write(path, serde_json::to_vec_pretty(&self.meta)?)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), CatalogError> {
        let path = self.root.join(INTEGRITY_DIR).join(MANIFEST_FILE);
        std::fs::write(path, serde_json::to_vec_pretty(&self.manifest)?)?;
        Ok(())
    }
}

fn parse_world_filename(path: &Path) -> Option<WorldId> {
    CatalogFormat::from_path(path).ok()?;
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("world_")?.parse().ok().map(WorldId)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
