//! Layered CLI configuration.
//!
//! Later sources override earlier ones:
//! 1. Default values
//! 2. TOML file (`worldenv.toml` in the working directory, or `--config`)
//! 3. Environment variables prefixed with `WORLDENV_`; nested keys use `__`,
//!    e.g. `WORLDENV_SWEEP__STEP_M=250`

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use worldenv_persist::CatalogFormat;

pub const CONFIG_FILE_NAME: &str = "worldenv.toml";
const ENV_PREFIX: &str = "WORLDENV_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldenvConfig {
    /// Directory of the world catalog.
    pub catalog_dir: PathBuf,
    /// Preset name or world file used when a command omits `<world>`.
    pub default_world: String,
    /// Encoding for newly created catalogs.
    pub format: CatalogFormat,
    pub sweep: SweepConfig,
}

/// Default column for `sweep` when flags are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub start_m: f64,
    pub end_m: f64,
    pub step_m: f64,
}

impl Default for WorldenvConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("worldenv-catalog"),
            default_world: "earth".to_string(),
            format: CatalogFormat::Json,
            sweep: SweepConfig::default(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_m: 0.0,
            end_m: 100_000.0,
            step_m: 10_000.0,
        }
    }
}

impl WorldenvConfig {
    /// Load from defaults, the TOML file and the environment, then validate.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = config_path.unwrap_or(Path::new(CONFIG_FILE_NAME));
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sweep = &self.sweep;
        if !sweep.step_m.is_finite() || sweep.step_m <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sweep.step_m must be positive, got {}",
                sweep.step_m
            )));
        }
        if !sweep.start_m.is_finite() || !sweep.end_m.is_finite() || sweep.end_m <= sweep.start_m {
            return Err(ConfigError::Invalid(format!(
                "sweep range is empty: {} to {}",
                sweep.start_m, sweep.end_m
            )));
        }
        if self.default_world.trim().is_empty() {
            return Err(ConfigError::Invalid("default_world must not be empty".into()));
        }
        Ok(())
    }
}
