//! Channel-backed agent adapter
//!
//! Each request travels as an [`AgentEnvelope`] over a bounded mpsc channel
//! together with a oneshot sender for the reply. Whatever owns the receiver
//! (an HTTP bridge, a subprocess driver, a test) answers through
//! [`AgentEnvelope::reply`]. The orchestrator's timeout bounds the wait.

use async_trait::async_trait;
use changebench_application::{AdapterError, AgentAdapter, AgentRequest, AgentResponse};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// A request waiting for its reply
pub struct AgentEnvelope {
    pub request: AgentRequest,
    reply_to: oneshot::Sender<Result<AgentResponse, AdapterError>>,
}

impl AgentEnvelope {
    /// Answer the request. Returns `false` if the orchestrator stopped waiting.
    pub fn reply(self, response: Result<AgentResponse, AdapterError>) -> bool {
        self.reply_to.send(response).is_ok()
    }
}

#[derive(Clone)]
pub struct ChannelAgentAdapter {
    sender: mpsc::Sender<AgentEnvelope>,
}

impl ChannelAgentAdapter {
    /// Create the adapter and the receiving end for the agent side
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<AgentEnvelope>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl AgentAdapter for ChannelAgentAdapter {
    async fn respond(&self, request: AgentRequest) -> Result<AgentResponse, AdapterError> {
        let (reply_to, reply) = oneshot::channel();
        self.sender
            .send(AgentEnvelope { request, reply_to })
            .await
            .map_err(|_| {
                warn!("Agent channel closed");
                AdapterError::Disconnected
            })?;
        reply.await.map_err(|_| AdapterError::Disconnected)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changebench_domain::Role;

    fn request() -> AgentRequest {
        AgentRequest {
            task_id: "t1".to_string(),
            turn_index: 2,
            role: Role::User,
            content: "I need to register.".to_string(),
            prior_tool_results: Vec::new(),
            policy: Some("policy".to_string()),
            tools: Some(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_round_trip_through_channel() {
        let (adapter, mut receiver) = ChannelAgentAdapter::new(4);
        let agent = tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let content = format!("echo: {}", envelope.request.content);
                envelope.reply(Ok(AgentResponse::new(content)));
            }
        });

        let response = adapter.respond(request()).await.unwrap();
        assert_eq!(response.content, "echo: I need to register.");

        drop(adapter);
        agent.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_receiver_is_disconnected() {
        let (adapter, receiver) = ChannelAgentAdapter::new(1);
        drop(receiver);
        assert_eq!(adapter.respond(request()).await, Err(AdapterError::Disconnected));
    }

    #[tokio::test]
    async fn test_dropped_envelope_is_disconnected() {
        let (adapter, mut receiver) = ChannelAgentAdapter::new(1);
        tokio::spawn(async move {
            let envelope = receiver.recv().await;
            drop(envelope);
        });
        assert_eq!(adapter.respond(request()).await, Err(AdapterError::Disconnected));
    }
}
