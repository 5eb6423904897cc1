//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording episode events
//! (user and agent turns, tool calls, goal shifts, resolutions) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures each conversation
//! in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured conversation event.
///
/// The adapter stamps each event with a UTC timestamp when it is written.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "user_turn", "tool_call", "goal_shift").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible; a failing sink must not abort an
/// episode.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
