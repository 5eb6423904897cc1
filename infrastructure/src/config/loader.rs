//! Configuration file loader with multi-source merging

use super::file_config::{ConfigError, FileConfig};
use changebench_application::EvaluationConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = "changebench.toml";
const ENV_PREFIX: &str = "CHANGEBENCH_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CHANGEBENCH_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./changebench.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/changebench/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let mut sources: Vec<PathBuf> = Vec::new();
        if let Some(global) = Self::global_config_path() {
            sources.push(global);
        }
        sources.push(PathBuf::from(PROJECT_FILE));
        if let Some(path) = config_path {
            sources.push(path.to_path_buf());
        }
        Self::load_from(&sources)
    }

    /// Load and convert straight into an [`EvaluationConfig`]
    pub fn load_evaluation(config_path: Option<&Path>) -> Result<EvaluationConfig, ConfigError> {
        Self::load(config_path)?.to_evaluation_config()
    }

    /// Merge defaults, the given files in order (missing ones are skipped),
    /// then the environment.
    pub fn load_from(sources: &[PathBuf]) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        for path in sources.iter().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("changebench").join("config.toml"))
    }
}
