//! Goal domain entities

use super::predicate::SuccessPredicate;
use crate::persona::mood::Mood;
use serde::{Deserialize, Serialize};

/// Identifier of a goal, unique within one task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for GoalId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a goal
///
/// ```text
/// Pending ──> Active ──> Resolved
///               │  ▲
///               ▼  │ (soft shift settled)
///             Shifted ──> Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Pending,
    Active,
    Shifted,
    Resolved,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Pending => "pending",
            GoalStatus::Active => "active",
            GoalStatus::Shifted => "shifted",
            GoalStatus::Resolved => "resolved",
            GoalStatus::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Resolved | GoalStatus::Abandoned)
    }

    /// Whether a success predicate can still resolve a goal in this status
    pub fn is_open(&self) -> bool {
        matches!(self, GoalStatus::Active | GoalStatus::Shifted)
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a goal transition was classified at injection time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    /// The goal was not reached through a shift
    #[default]
    None,
    /// Adjacent category: an acknowledgment is enough to recover
    Soft,
    /// Unrelated category: the agent must restate the new objective
    Hard,
}

impl ShiftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftKind::None => "none",
            ShiftKind::Soft => "soft",
            ShiftKind::Hard => "hard",
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Condition that injects a declared goal as a shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftTrigger {
    /// Voiced at the first user turn whose index is at least `turn`
    AtTurn { turn: usize },
    /// Voiced once the goal on top of the stack is resolved
    OnPreviousResolved,
    /// Voiced once the persona mood reaches `mood`
    OnMood { mood: Mood },
    /// Voiced after the current goal went `turns` agent turns without resolution
    AfterUnresolvedTurns { turns: usize },
}

/// Snapshot of runtime signals a trigger is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext {
    /// Index the next user turn will carry
    pub next_user_turn: usize,
    /// Whether the goal on top of the stack is resolved
    pub top_resolved: bool,
    /// Agent turns since the top goal became active without resolving it
    pub unresolved_agent_turns: usize,
    pub mood: Mood,
}

impl ShiftTrigger {
    pub fn is_satisfied(&self, ctx: &TriggerContext) -> bool {
        match self {
            ShiftTrigger::AtTurn { turn } => ctx.next_user_turn >= *turn,
            ShiftTrigger::OnPreviousResolved => ctx.top_resolved,
            ShiftTrigger::OnMood { mood } => ctx.mood >= *mood,
            ShiftTrigger::AfterUnresolvedTurns { turns } => {
                !ctx.top_resolved && ctx.unresolved_agent_turns >= *turns
            }
        }
    }
}

/// Declared goal inside a task definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSpec {
    pub id: GoalId,
    /// Category used for the adjacency rule (e.g. "course_registration")
    pub category: String,
    /// What the simulated user wants, in the user's words
    pub description: String,
    /// Phrases that identify this objective in agent speech
    #[serde(default)]
    pub keywords: Vec<String>,
    pub success: SuccessPredicate,
    /// Absent on the first goal; later goals without a trigger never activate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<ShiftTrigger>,
}

impl GoalSpec {
    pub fn new(
        id: impl Into<GoalId>,
        category: impl Into<String>,
        description: impl Into<String>,
        success: SuccessPredicate,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            description: description.into(),
            keywords: Vec::new(),
            success,
            trigger: None,
        }
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trigger(mut self, trigger: ShiftTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

/// Runtime goal, one per declared [`GoalSpec`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub spec: GoalSpec,
    pub status: GoalStatus,
    pub shift_kind: ShiftKind,
    /// User turn that voiced the shift into this goal
    pub trigger_turn: Option<usize>,
    pub activated_turn: Option<usize>,
    pub resolved_turn: Option<usize>,
    /// First agent turn aligned with this goal after its shift
    pub aligned_turn: Option<usize>,
    /// Kind of the shift that pushed another goal over this one
    pub displaced_by: Option<ShiftKind>,
}

impl Goal {
    pub fn new(spec: GoalSpec) -> Self {
        Self {
            spec,
            status: GoalStatus::Pending,
            shift_kind: ShiftKind::None,
            trigger_turn: None,
            activated_turn: None,
            resolved_turn: None,
            aligned_turn: None,
            displaced_by: None,
        }
    }

    pub fn id(&self) -> &GoalId {
        &self.spec.id
    }

    pub fn category(&self) -> &str {
        &self.spec.category
    }
}

/// Record of one shift injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftEvent {
    pub from: GoalId,
    pub to: GoalId,
    pub kind: ShiftKind,
    pub trigger_turn: usize,
}
