//! Score Episode use case
//!
//! Applies the metrics engine to finished-episode evidence. Used by the
//! orchestrator at the end of every run, and on its own to re-score a saved
//! [`EpisodeOutcome`] under different weights or rubrics.

use crate::config::EvaluationConfig;
use crate::use_cases::run_episode::EpisodeOutcome;
use changebench_domain::{
    DomainPack, EpisodeEvidence, Goal, MetricsEngine, RecordOverlay, ScoreCard, TaskRecords, Termination,
    ToolCallRecord, Transcript,
};
use std::sync::Arc;

/// Borrowed evidence of one episode
pub struct ScoreEpisodeInput<'a> {
    pub task_id: &'a str,
    pub termination: &'a Termination,
    pub transcript: &'a Transcript,
    pub goals: &'a [Goal],
    pub tool_calls: &'a [ToolCallRecord],
    pub overlay: &'a RecordOverlay,
    pub turn_budget: usize,
}

pub struct ScoreEpisodeUseCase {
    pack: Arc<DomainPack>,
    engine: MetricsEngine,
}

impl ScoreEpisodeUseCase {
    pub fn new(pack: Arc<DomainPack>, engine: MetricsEngine) -> Self {
        Self { pack, engine }
    }

    pub fn from_config(pack: Arc<DomainPack>, config: &EvaluationConfig) -> Self {
        Self::new(pack, config.metrics_engine())
    }

    pub fn execute(&self, input: ScoreEpisodeInput<'_>) -> ScoreCard {
        let records = TaskRecords::new(&self.pack.records, input.overlay);
        self.engine.score(&EpisodeEvidence {
            task_id: input.task_id,
            termination: input.termination,
            transcript: input.transcript,
            goals: input.goals,
            tool_calls: input.tool_calls,
            records: &records,
            turn_budget: input.turn_budget,
        })
    }

    /// Score a previously recorded outcome again
    pub fn rescore(&self, outcome: &EpisodeOutcome) -> ScoreCard {
        self.execute(ScoreEpisodeInput {
            task_id: &outcome.task_id,
            termination: &outcome.termination,
            transcript: &outcome.transcript,
            goals: &outcome.goal_timeline,
            tool_calls: &outcome.tool_calls,
            overlay: &outcome.final_records,
            turn_budget: outcome.turn_budget,
        })
    }
}
