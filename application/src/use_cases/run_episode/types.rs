//! Type definitions for the RunEpisode use case.

use changebench_domain::{
    Goal, GoalSequencer, PersonaEngine, RecordOverlay, ScoreCard, ShiftEvent, TaskDefinition, Termination,
    ToolCall, ToolCallRecord, Transcript,
};
use serde::{Deserialize, Serialize};

/// Which task to run, and with which seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEpisodeInput {
    pub task_id: String,
    /// Seeds the persona engine; equal seeds replay equal user turns
    pub seed: u64,
    pub trial: usize,
}

impl RunEpisodeInput {
    pub fn new(task_id: impl Into<String>, seed: u64) -> Self {
        Self {
            task_id: task_id.into(),
            seed,
            trial: 0,
        }
    }

    pub fn with_trial(mut self, trial: usize) -> Self {
        self.trial = trial;
        self
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub task_id: String,
    pub trial: usize,
    pub seed: u64,
    pub turn_budget: usize,
    pub termination: Termination,
    pub transcript: Transcript,
    /// Finalized goals: every entry is resolved or abandoned
    pub goal_timeline: Vec<Goal>,
    pub shifts: Vec<ShiftEvent>,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Task-local writes made by stateful tools
    pub final_records: RecordOverlay,
    pub scorecard: ScoreCard,
}

impl EpisodeOutcome {
    pub fn is_complete(&self) -> bool {
        self.scorecard.is_complete()
    }
}

/// Task-scoped pieces resolved from the pack before the first turn
pub(super) struct PreparedTask {
    pub task: TaskDefinition,
    pub persona: PersonaEngine,
    pub sequencer: GoalSequencer,
}

/// Carry-over between phases of one run
#[derive(Default)]
pub(super) struct TurnCarry {
    /// Shift injected at the last check, voiced by the next user turn
    pub pending_shift: Option<ShiftEvent>,
    /// Calls from the latest agent response, executed in `ToolExchange`
    pub pending_calls: Vec<ToolCall>,
    /// Results delivered with the next agent request
    pub pending_results: Vec<ToolCallRecord>,
    pub unresolved_turns: usize,
    pub shifts: Vec<ShiftEvent>,
}
