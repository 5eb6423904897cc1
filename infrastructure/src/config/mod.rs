//! Configuration file loading for changebench
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CHANGEBENCH_*` environment variables
//! 2. Explicitly given config file
//! 3. Project root: `./changebench.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/changebench/config.toml`
//! 5. Default values (score weights have none)

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, FileConfig, FileEvaluationConfig, FileScoringConfig,
};
pub use loader::ConfigLoader;
