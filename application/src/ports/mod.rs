//! Ports (interfaces) for external dependencies
//!
//! Ports define the boundary between the orchestrator and the outside world:
//! the agent under test, the conversation log sink, and progress observers.
//! Adapters live in the infrastructure layer.

pub mod agent_adapter;
pub mod conversation_logger;
pub mod episode_progress;
