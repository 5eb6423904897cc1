//! Agent adapter port
//!
//! Defines how the orchestrator talks to the agent under test. Every
//! exchange is one request and one response; the orchestrator bounds the
//! wait with the configured agent timeout.

use async_trait::async_trait;
use changebench_domain::{Role, ToolCall, ToolCallRecord, ToolDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors an adapter can report instead of a response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Agent disconnected")]
    Disconnected,

    #[error("Agent request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed agent response: {0}")]
    Protocol(String),
}

/// Message sent to the agent for one of its turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub task_id: String,
    /// Index the agent's reply will carry in the transcript
    pub turn_index: usize,
    /// Speaker of `content`
    pub role: Role,
    pub content: String,
    /// Results of the tool calls the agent issued in its previous turn
    #[serde(default)]
    pub prior_tool_results: Vec<ToolCallRecord>,
    /// Domain policy document (first request only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Tool schemas available in this task (first request only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}

impl AgentRequest {
    pub fn is_first(&self) -> bool {
        self.policy.is_some()
    }
}

/// Agent reply: text plus the tool calls to execute, in order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }
}

/// Agent under test
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    async fn respond(&self, request: AgentRequest) -> Result<AgentResponse, AdapterError>;
}
