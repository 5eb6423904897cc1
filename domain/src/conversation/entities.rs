//! Conversation entities

use super::phase::{AbortReason, Phase};
use crate::goal::entities::GoalId;
use crate::goal::sequencer::GoalSequencer;
use crate::persona::engine::UserIntent;
use crate::tool::records::RecordOverlay;
use crate::tool::value_objects::ToolCallRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One message of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based, one per message
    pub index: usize,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<UserIntent>,
    /// Goal on top of the stack when the turn was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,
}

impl Turn {
    pub fn user(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            role: Role::User,
            content: content.into(),
            intent: None,
            goal_id: None,
        }
    }

    pub fn agent(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            role: Role::Agent,
            content: content.into(),
            intent: None,
            goal_id: None,
        }
    }

    pub fn with_intent(mut self, intent: UserIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_goal(mut self, goal_id: Option<GoalId>) -> Self {
        self.goal_id = goal_id;
        self
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}

/// Frozen turn log of a finished episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn agent_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.is_agent())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.turns.last().map(|t| t.index).unwrap_or(0)
    }
}

impl From<Vec<Turn>> for Transcript {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

/// Mutable state of one running episode, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub task_id: String,
    pub phase: Phase,
    pub sequencer: GoalSequencer,
    turns: Vec<Turn>,
    tool_calls: Vec<ToolCallRecord>,
    overlay: RecordOverlay,
    turn_index: usize,
}

/// Everything a finished episode leaves behind
#[derive(Debug, Clone)]
pub struct ConversationParts {
    pub transcript: Transcript,
    pub sequencer: GoalSequencer,
    pub tool_calls: Vec<ToolCallRecord>,
    pub overlay: RecordOverlay,
}

impl ConversationState {
    pub fn new(task_id: impl Into<String>, sequencer: GoalSequencer) -> Self {
        Self {
            task_id: task_id.into(),
            phase: Phase::Init,
            sequencer,
            turns: Vec::new(),
            tool_calls: Vec::new(),
            overlay: RecordOverlay::default(),
            turn_index: 0,
        }
    }

    /// Index of the most recent turn (0 before the first message)
    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        &self.tool_calls
    }

    pub fn overlay(&self) -> &RecordOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut RecordOverlay {
        &mut self.overlay
    }

    fn push(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turn_index
    }

    /// Append a user turn; the turn index advances by one
    pub fn push_user(&mut self, content: impl Into<String>, intent: UserIntent) -> usize {
        self.turn_index += 1;
        let goal = self.sequencer.current_goal().map(|g| g.id().clone());
        let turn = Turn::user(self.turn_index, content)
            .with_intent(intent)
            .with_goal(goal);
        self.push(turn)
    }

    /// Append an agent turn; the turn index advances by one
    pub fn push_agent(&mut self, content: impl Into<String>) -> usize {
        self.turn_index += 1;
        let goal = self.sequencer.current_goal().map(|g| g.id().clone());
        let turn = Turn::agent(self.turn_index, content).with_goal(goal);
        self.push(turn)
    }

    pub fn record_tool_call(&mut self, record: ToolCallRecord) {
        self.tool_calls.push(record);
    }

    pub fn last_agent_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_agent())
    }

    pub fn tool_calls_at(&self, turn: usize) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(move |r| r.turn == turn)
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn abort(&mut self, reason: AbortReason) {
        self.phase = Phase::Aborted(reason);
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Freeze the turn log and hand over the remaining state
    pub fn into_parts(self) -> ConversationParts {
        ConversationParts {
            transcript: Transcript::from(self.turns),
            sequencer: self.sequencer,
            tool_calls: self.tool_calls,
            overlay: self.overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::entities::GoalSpec;
    use crate::goal::predicate::SuccessPredicate;

    fn state() -> ConversationState {
        let mut sequencer = GoalSequencer::new([GoalSpec::new(
            "g1",
            "registration",
            "Register me",
            SuccessPredicate::tool_succeeded("register"),
        )]);
        sequencer.activate_first(1);
        ConversationState::new("task-1", sequencer)
    }

    #[test]
    fn test_turn_indices_are_monotonic() {
        let mut state = state();
        assert_eq!(state.push_user("hi", UserIntent::Opening), 1);
        assert_eq!(state.push_agent("hello"), 2);
        assert_eq!(state.push_user("more", UserIntent::FollowUp), 3);
        let indices: Vec<usize> = state.turns().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(state.last_agent_turn().unwrap().index, 2);
        assert_eq!(state.turns()[0].goal_id, Some(GoalId::new("g1")));
    }

    #[test]
    fn test_abort_finishes_state() {
        let mut state = state();
        state.set_phase(Phase::UserTurn);
        assert!(!state.is_finished());
        state.abort(AbortReason::TurnBudgetExceeded);
        assert!(state.is_finished());
    }

    #[test]
    fn test_into_parts_freezes_transcript() {
        let mut state = state();
        state.push_user("hi", UserIntent::Opening);
        state.push_agent("hello");
        let parts = state.into_parts();
        assert_eq!(parts.transcript.len(), 2);
        assert_eq!(parts.transcript.agent_turns().count(), 1);
        assert_eq!(parts.transcript.last_index(), 2);
    }
}
