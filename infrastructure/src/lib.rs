//! Infrastructure layer for changebench
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration and domain pack loading.

pub mod agents;
pub mod config;
pub mod logging;
pub mod pack;
pub mod report;
pub mod telemetry;

// Re-export commonly used types
pub use agents::{AgentEnvelope, ChannelAgentAdapter, ScriptedAgent, ScriptedTurn};
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use logging::JsonlConversationLogger;
pub use pack::{PackLoadError, PackLoader};
pub use report::{JsonReportWriter, ReportError};
pub use telemetry::init_tracing;
