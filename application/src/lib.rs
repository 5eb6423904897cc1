//! Application layer for changebench
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BatchParams, EvaluationConfig};
pub use ports::{
    agent_adapter::{AdapterError, AgentAdapter, AgentRequest, AgentResponse},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    episode_progress::{EpisodeProgressNotifier, NoEpisodeProgress},
};
pub use use_cases::run_batch::{BatchReport, BatchSummary, RunBatchInput, RunBatchUseCase};
pub use use_cases::run_episode::{EpisodeOutcome, RunEpisodeInput, RunEpisodeUseCase};
pub use use_cases::score_episode::{ScoreEpisodeInput, ScoreEpisodeUseCase};
pub use use_cases::tool_mediator::ToolMediator;
