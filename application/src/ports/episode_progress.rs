//! Episode progress port.
//!
//! [`EpisodeProgressNotifier`] is an output port for observing a running
//! episode. All methods have no-op defaults.

use changebench_domain::{Phase, ScoreCard, ShiftEvent, ToolCallRecord, Turn};

pub trait EpisodeProgressNotifier: Send + Sync {
    /// Called when the orchestrator enters a new phase
    fn on_phase_change(&self, _task_id: &str, _phase: &Phase) {}

    /// Called after a user or agent turn is appended
    fn on_turn(&self, _task_id: &str, _turn: &Turn) {}

    /// Called after the tool mediator handled a call
    fn on_tool_call(&self, _task_id: &str, _record: &ToolCallRecord) {}

    /// Called when a goal shift is injected
    fn on_shift(&self, _task_id: &str, _shift: &ShiftEvent) {}

    /// Called once per episode with its score card
    fn on_episode_complete(&self, _task_id: &str, _scorecard: &ScoreCard) {}
}

/// No-op implementation
pub struct NoEpisodeProgress;

impl EpisodeProgressNotifier for NoEpisodeProgress {}
