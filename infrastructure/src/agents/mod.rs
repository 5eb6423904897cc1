//! Agent adapters
//!
//! - [`ScriptedAgent`] - replays per-task scripts (offline runs, tests)
//! - [`ChannelAgentAdapter`] - request/reply message passing over tokio channels

mod channel;
mod scripted;

pub use channel::{AgentEnvelope, ChannelAgentAdapter};
pub use scripted::{ScriptedAgent, ScriptedTurn};
