//! Evaluation parameters - orchestrator, scoring and batch control.
//!
//! [`EvaluationConfig`] groups everything a run needs besides the pack and
//! the agent. It has no `Default`: score weights are always supplied by the
//! caller (usually via the infrastructure config loader).

use changebench_domain::{AlignmentRule, CommRubric, MetricsEngine, RedundancyParams, ScoreWeights};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch runner parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchParams {
    /// Episodes running at the same time
    pub max_parallel: usize,
    /// Runs per task
    pub trials: usize,
    /// Trial `n` uses seed `base_seed + n`
    pub base_seed: u64,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            trials: 1,
            base_seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Upper bound on one agent reply
    pub agent_timeout: Duration,
    pub weights: ScoreWeights,
    pub rubric: CommRubric,
    pub redundancy: RedundancyParams,
    pub alignment: AlignmentRule,
    pub batch: BatchParams,
}

impl EvaluationConfig {
    pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            agent_timeout: Self::DEFAULT_AGENT_TIMEOUT,
            weights,
            rubric: CommRubric::default(),
            redundancy: RedundancyParams::default(),
            alignment: AlignmentRule::default(),
            batch: BatchParams::default(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_rubric(mut self, rubric: CommRubric) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_redundancy(mut self, redundancy: RedundancyParams) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn with_alignment(mut self, alignment: AlignmentRule) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_batch(mut self, batch: BatchParams) -> Self {
        self.batch = batch;
        self
    }

    /// Metrics engine configured with these weights and rubrics
    pub fn metrics_engine(&self) -> MetricsEngine {
        MetricsEngine::new(self.weights.clone())
            .with_rubric(self.rubric.clone())
            .with_redundancy(self.redundancy.clone())
    }
}
