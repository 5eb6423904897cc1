//! Scripted agent adapter
//!
//! Replays a fixed script per task. The reply for a request is chosen by
//! the agent's turn ordinal (`turn_index / 2 - 1`), so one adapter can serve
//! concurrent episodes and repeated trials without shared mutable state.

use async_trait::async_trait;
use changebench_application::{AdapterError, AgentAdapter, AgentRequest, AgentResponse};
use changebench_domain::ToolCall;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One scripted agent turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedTurn {
    Reply {
        content: String,
        #[serde(default)]
        tool_calls: Vec<ToolCall>,
    },
    /// Never answer; the orchestrator's timeout fires
    Stall,
    /// Fail the request with an adapter error
    Fail { message: String },
}

impl ScriptedTurn {
    pub fn reply(content: impl Into<String>) -> Self {
        ScriptedTurn::Reply {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Add a tool call to a `Reply`; other variants are returned unchanged
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        if let ScriptedTurn::Reply { tool_calls, .. } = &mut self {
            tool_calls.push(call);
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptedAgent {
    scripts: HashMap<String, Vec<ScriptedTurn>>,
    /// Reply once a task's script is exhausted (or for unknown tasks)
    #[serde(default)]
    fallback: Option<String>,
}

impl ScriptedAgent {
    pub const DEFAULT_FALLBACK: &'static str = "Is there anything else I can help you with?";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, task_id: impl Into<String>, turns: Vec<ScriptedTurn>) -> Self {
        self.scripts.insert(task_id.into(), turns);
        self
    }

    pub fn with_fallback(mut self, content: impl Into<String>) -> Self {
        self.fallback = Some(content.into());
        self
    }

    /// Load `{ "scripts": { task_id: [turn, ...] }, "fallback": "..." }`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AdapterError::Protocol(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| AdapterError::Protocol(format!("{}: {}", path.display(), e)))
    }

    fn turn_for(&self, request: &AgentRequest) -> ScriptedTurn {
        let ordinal = (request.turn_index / 2).saturating_sub(1);
        self.scripts
            .get(&request.task_id)
            .and_then(|turns| turns.get(ordinal))
            .cloned()
            .unwrap_or_else(|| {
                ScriptedTurn::reply(self.fallback.as_deref().unwrap_or(Self::DEFAULT_FALLBACK))
            })
    }
}

#[async_trait]
impl AgentAdapter for ScriptedAgent {
    async fn respond(&self, request: AgentRequest) -> Result<AgentResponse, AdapterError> {
        let turn = self.turn_for(&request);
        debug!(task = %request.task_id, turn = request.turn_index, "Scripted agent turn");
        match turn {
            ScriptedTurn::Reply { content, tool_calls } => Ok(AgentResponse { content, tool_calls }),
            ScriptedTurn::Stall => std::future::pending().await,
            ScriptedTurn::Fail { message } => Err(AdapterError::RequestFailed(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changebench_domain::Role;
    use std::time::Duration;

    fn request(task_id: &str, turn_index: usize) -> AgentRequest {
        AgentRequest {
            task_id: task_id.to_string(),
            turn_index,
            role: Role::User,
            content: "hi".to_string(),
            prior_tool_results: Vec::new(),
            policy: None,
            tools: None,
        }
    }

    #[tokio::test]
    async fn test_replies_by_turn_ordinal() {
        let agent = ScriptedAgent::new().with_script(
            "t1",
            vec![
                ScriptedTurn::reply("first"),
                ScriptedTurn::reply("second").with_tool_call(ToolCall::new("get_course")),
            ],
        );

        assert_eq!(agent.respond(request("t1", 4)).await.unwrap().tool_calls.len(), 1);
        assert_eq!(agent.respond(request("t1", 2)).await.unwrap().content, "first");
        assert_eq!(
            agent.respond(request("t1", 6)).await.unwrap().content,
            ScriptedAgent::DEFAULT_FALLBACK
        );
        assert_eq!(
            agent.respond(request("other", 2)).await.unwrap().content,
            ScriptedAgent::DEFAULT_FALLBACK
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_never_answers() {
        let agent = ScriptedAgent::new().with_script("t1", vec![ScriptedTurn::Stall]);
        let result = tokio::time::timeout(Duration::from_secs(5), agent.respond(request("t1", 2))).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_script_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"{
                "scripts": {
                    "t1": [
                        {"kind": "reply", "content": "Checking", "tool_calls": [{"tool_name": "get_course", "arguments": {"course_id": "CS101"}}]},
                        {"kind": "stall"},
                        {"kind": "fail", "message": "boom"}
                    ]
                },
                "fallback": "Anything else?"
            }"#,
        )
        .unwrap();

        let agent = ScriptedAgent::from_file(&path).unwrap();
        let first = agent.turn_for(&request("t1", 2));
        assert!(matches!(first, ScriptedTurn::Reply { ref tool_calls, .. } if tool_calls.len() == 1));
        assert_eq!(agent.turn_for(&request("t1", 4)), ScriptedTurn::Stall);
        assert_eq!(agent.turn_for(&request("t1", 10)), ScriptedTurn::reply("Anything else?"));
    }
}
