//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.
//!
//! ```toml
//! [evaluation]
//! agent_timeout_ms = 30000
//!
//! [scoring.weights]
//! tsr = 0.4
//! gsrt = 0.2
//! comm_quality = 0.2
//! action_exec = 0.2
//!
//! [batch]
//! max_parallel = 8
//! trials = 4
//! ```

use changebench_application::{BatchParams, EvaluationConfig};
use changebench_domain::{AlignmentRule, CommRubric, RedundancyParams, ScoreWeights};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("[scoring.weights] is required; every evaluation states its aggregate weights")]
    MissingWeights,

    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub evaluation: FileEvaluationConfig,
    pub scoring: FileScoringConfig,
    pub batch: BatchParams,
}

/// `[evaluation]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEvaluationConfig {
    /// Upper bound on one agent reply, in milliseconds
    pub agent_timeout_ms: u64,
}

impl Default for FileEvaluationConfig {
    fn default() -> Self {
        Self {
            agent_timeout_ms: EvaluationConfig::DEFAULT_AGENT_TIMEOUT.as_millis() as u64,
        }
    }
}

/// `[scoring]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileScoringConfig {
    /// Aggregate weights; no built-in default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<ScoreWeights>,
    pub rubric: CommRubric,
    pub redundancy: RedundancyParams,
    pub alignment: AlignmentRule,
}

impl FileConfig {
    /// Convert into the application's evaluation config
    pub fn to_evaluation_config(&self) -> Result<EvaluationConfig, ConfigError> {
        let weights = self.scoring.weights.clone().ok_or(ConfigError::MissingWeights)?;
        weights
            .validate()
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;

        if self.evaluation.agent_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "evaluation.agent_timeout_ms must be positive".to_string(),
            ));
        }
        if self.batch.max_parallel == 0 {
            return Err(ConfigError::Invalid("batch.max_parallel must be positive".to_string()));
        }

        Ok(EvaluationConfig::new(weights)
            .with_agent_timeout(Duration::from_millis(self.evaluation.agent_timeout_ms))
            .with_rubric(self.scoring.rubric.clone())
            .with_redundancy(self.scoring.redundancy.clone())
            .with_alignment(self.scoring.alignment.clone())
            .with_batch(self.batch.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_weights_is_an_error() {
        let config: FileConfig = toml::from_str("[evaluation]\nagent_timeout_ms = 1000\n").unwrap();
        assert!(matches!(config.to_evaluation_config(), Err(ConfigError::MissingWeights)));
    }

    #[test]
    fn test_full_config_converts() {
        let toml_str = r#"
[evaluation]
agent_timeout_ms = 1500

[scoring.weights]
tsr = 0.4
gsrt = 0.2
comm_quality = 0.2
action_exec = 0.2

[scoring.rubric]
max_turn_chars = 400

[batch]
max_parallel = 2
trials = 5
base_seed = 100
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let evaluation = config.to_evaluation_config().unwrap();
        assert_eq!(evaluation.agent_timeout, Duration::from_millis(1500));
        assert_eq!(evaluation.weights.tsr, 0.4);
        assert_eq!(evaluation.rubric.max_turn_chars, 400);
        assert_eq!(evaluation.batch.trials, 5);
        assert_eq!(evaluation.batch.base_seed, 100);
        // unspecified rubric fields keep their defaults
        assert_eq!(evaluation.rubric.penalty, CommRubric::default().penalty);
    }

    #[test]
    fn test_default_config_has_only_evaluation_sections() {
        let rendered = toml::to_string(&FileConfig::default()).unwrap();
        let value: toml::Table = toml::from_str(&rendered).unwrap();
        let mut sections: Vec<&str> = value.keys().map(String::as_str).collect();
        sections.sort_unstable();
        assert_eq!(sections, ["batch", "evaluation", "scoring"]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let toml_str = r#"
[scoring.weights]
tsr = -1.0
gsrt = 0.2
comm_quality = 0.2
action_exec = 0.2
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.to_evaluation_config(),
            Err(ConfigError::InvalidWeights(_))
        ));
    }
}
