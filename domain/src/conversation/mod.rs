//! Conversation domain module
//!
//! Turn log, orchestrator phases, and the per-episode [`ConversationState`]
//! that the orchestrator owns exclusively while an episode runs.

pub mod entities;
pub mod phase;

pub use entities::{ConversationParts, ConversationState, Role, Transcript, Turn};
pub use phase::{AbortReason, Phase, Termination};
