//! Domain layer for changebench
//!
//! This crate contains the evaluation engine's entities, value objects and
//! pure logic. It performs no I/O and has no dependency on the application
//! or infrastructure layers.
//!
//! # Core Concepts
//!
//! ## Goal shifts
//!
//! A task declares an ordered list of goals. The first is active from the
//! start; later goals are pushed onto the goal stack mid-conversation when
//! their trigger fires:
//!
//! - **Soft shift**: adjacent category, the agent must acknowledge it
//! - **Hard shift**: unrelated category, the agent must replan
//!
//! ## Scoring
//!
//! A finished episode is scored once on TSR, GSRT, CommQuality and
//! ActionExec, combined into an aggregate with external weights.

pub mod conversation;
pub mod core;
pub mod goal;
pub mod metrics;
pub mod pack;
pub mod persona;
pub mod tool;

// Re-export commonly used types
pub use conversation::{
    entities::{ConversationParts, ConversationState, Role, Transcript, Turn},
    phase::{AbortReason, Phase, Termination},
};
pub use core::error::DomainError;
pub use goal::{
    adjacency::AdjacencyTable,
    alignment::AlignmentRule,
    entities::{Goal, GoalId, GoalSpec, GoalStatus, ShiftEvent, ShiftKind, ShiftTrigger, TriggerContext},
    predicate::{PredicateView, SuccessPredicate},
    sequencer::GoalSequencer,
};
pub use metrics::{
    ActionExecBreakdown, CommBreakdown, CommRubric, EpisodeEvidence, GsrtSummary, MetricsEngine,
    RedundancyParams, ScoreCard, ScoreWeights, TcrrResult, TsrBreakdown, pass_hat_k,
};
pub use pack::{DomainPack, TaskDefinition};
pub use persona::{
    DialoguePolicy, Mood, Persona, PersonaContext, PersonaEngine, TraitVector, UserIntent,
    UserUtterance,
};
pub use tool::{
    ParamType, RecordOverlay, RecordStore, RecordView, SchemaValidator, TaskRecords, ToolAccess,
    ToolCall, ToolCallRecord, ToolDefinition, ToolEffect, ToolError, ToolErrorKind, ToolOutcome,
    ToolParameter, ToolSpec, ToolValidator, execute_effect, normalized_args,
};
