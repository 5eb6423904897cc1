//! Metrics engine: post-hoc scoring of a finished episode

use super::action_exec::{RedundancyParams, action_execution};
use super::comm_quality::{CommRubric, communication_quality};
use super::gsrt::goal_shift_recovery;
use super::scorecard::{ScoreCard, ScoreCardParts, ScoreWeights};
use super::tsr::task_success_rate;
use crate::conversation::entities::Transcript;
use crate::conversation::phase::Termination;
use crate::goal::entities::Goal;
use crate::goal::predicate::PredicateView;
use crate::tool::records::RecordView;
use crate::tool::value_objects::ToolCallRecord;

/// Everything a finished episode leaves for scoring
pub struct EpisodeEvidence<'a> {
    pub task_id: &'a str,
    pub termination: &'a Termination,
    pub transcript: &'a Transcript,
    /// Finalized goal timeline
    pub goals: &'a [Goal],
    pub tool_calls: &'a [ToolCallRecord],
    /// Final task-local data state
    pub records: &'a dyn RecordView,
    pub turn_budget: usize,
}

#[derive(Debug, Clone)]
pub struct MetricsEngine {
    weights: ScoreWeights,
    rubric: CommRubric,
    redundancy: RedundancyParams,
}

impl MetricsEngine {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            rubric: CommRubric::default(),
            redundancy: RedundancyParams::default(),
        }
    }

    pub fn with_rubric(mut self, rubric: CommRubric) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_redundancy(mut self, redundancy: RedundancyParams) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Produce the single score card of an episode
    pub fn score(&self, evidence: &EpisodeEvidence<'_>) -> ScoreCard {
        let view = PredicateView {
            turns: evidence.transcript.turns(),
            tool_calls: evidence.tool_calls,
            records: evidence.records,
            since_turn: 0,
        };
        let tsr = task_success_rate(evidence.goals, &view);
        let gsrt = goal_shift_recovery(evidence.goals, evidence.tool_calls, evidence.turn_budget);
        let comm = communication_quality(evidence.transcript, evidence.tool_calls, &self.rubric);
        let agent_turns: Vec<usize> = evidence.transcript.agent_turns().map(|t| t.index).collect();
        let action = action_execution(evidence.tool_calls, &agent_turns, &self.redundancy);

        let aggregate = self.weights.aggregate(
            tsr.score,
            gsrt.as_ref().map(|g| g.score),
            comm.score,
            action.score,
        );
        let complete = evidence.termination.is_complete() && !tsr.has_errors();

        ScoreCard::from_parts(ScoreCardParts {
            task_id: evidence.task_id.to_string(),
            termination: evidence.termination.clone(),
            complete,
            aggregate,
            tsr,
            gsrt,
            comm,
            action,
        })
    }
}
