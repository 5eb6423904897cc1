//! Tool mediator
//!
//! Validates and executes the agent's tool calls for one task. Every call,
//! accepted or rejected, becomes a [`ToolCallRecord`].
//!
//! | Check (in order) | Failure | Flag |
//! |------------------|---------|------|
//! | tool exists | `NotFound` | schema-invalid |
//! | arguments match schema | `InvalidArgs` | schema-invalid |
//! | customer authenticated, if required | `Unauthorized` | precondition |
//! | prerequisite tools succeeded | `PrereqUnmet` | precondition |
//!
//! Accepted calls wait for the tool's simulated latency and then run the
//! declared effect against the pack records plus the task's overlay. A call
//! that passed the schema check stays schema-valid even when its effect
//! fails (missing record, duplicate key).

use crate::use_cases::shared::sleep_cancellable;
use changebench_domain::{
    DomainError, DomainPack, RecordOverlay, SchemaValidator, ToolCall, ToolCallRecord, ToolError,
    ToolOutcome, ToolValidator, execute_effect,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct MemoEntry {
    version: u64,
    outcome: ToolOutcome,
}

/// Per-task tool mediator
///
/// Holds the task's authentication flag, the set of tools that have
/// succeeded, and the read memo. Create one per episode.
pub struct ToolMediator {
    pack: Arc<DomainPack>,
    validator: SchemaValidator,
    succeeded: HashSet<String>,
    authenticated: bool,
    memo: HashMap<(String, String), MemoEntry>,
    cancellation_token: Option<CancellationToken>,
}

impl ToolMediator {
    pub fn new(pack: Arc<DomainPack>) -> Self {
        Self {
            pack,
            validator: SchemaValidator,
            succeeded: HashSet::new(),
            authenticated: false,
            memo: HashMap::new(),
            cancellation_token: None,
        }
    }

    /// Set a cancellation token for the latency wait
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Validate and execute one call issued at agent turn `turn`.
    ///
    /// Rejections are returned as records. Only a missing collection
    /// (`DomainData`) or cancellation is an `Err`.
    pub async fn dispatch(
        &mut self,
        call: ToolCall,
        turn: usize,
        overlay: &mut RecordOverlay,
    ) -> Result<ToolCallRecord, DomainError> {
        let started = Instant::now();
        let pack = Arc::clone(&self.pack);

        let Some(definition) = pack.tools.get(&call.tool_name) else {
            warn!(tool = %call.tool_name, turn, "Unknown tool");
            let outcome = ToolError::not_found(format!("tool '{}'", call.tool_name)).into();
            return Ok(ToolCallRecord::new(call, outcome, turn, started.elapsed()).with_schema_valid(false));
        };

        if let Err(e) = self.validator.validate(&call, definition) {
            debug!(tool = %call.tool_name, turn, error = %e, "Rejected tool call");
            return Ok(ToolCallRecord::new(call, e.into(), turn, started.elapsed()));
        }

        if definition.requires_auth && !self.authenticated {
            let outcome = ToolError::unauthorized(&definition.name).into();
            return Ok(ToolCallRecord::new(call, outcome, turn, started.elapsed()));
        }

        if let Some(missing) = definition
            .preconditions
            .iter()
            .find(|p| !self.succeeded.contains(p.as_str()))
        {
            let outcome = ToolError::prereq_unmet(&definition.name, missing).into();
            return Ok(ToolCallRecord::new(call, outcome, turn, started.elapsed()));
        }

        sleep_cancellable(Duration::from_millis(definition.latency_ms), &self.cancellation_token).await?;

        let collection = definition.effect.collection();
        let key = call.identity();
        let cached = if definition.access.is_read() {
            self.memo
                .get(&key)
                .filter(|entry| entry.version == overlay.version(collection))
                .map(|entry| entry.outcome.clone())
        } else {
            None
        };

        let outcome = match cached {
            Some(outcome) => {
                debug!(tool = %call.tool_name, turn, "Read served from memo");
                outcome
            }
            None => {
                let outcome = execute_effect(&definition.effect, &call, &pack.records, overlay)?;
                if definition.access.is_read() {
                    self.memo.insert(
                        key,
                        MemoEntry {
                            version: overlay.version(collection),
                            outcome: outcome.clone(),
                        },
                    );
                }
                outcome
            }
        };

        if outcome.is_success() {
            self.succeeded.insert(definition.name.clone());
            if definition.authenticates {
                self.authenticated = true;
            }
        }

        debug!(
            tool = %call.tool_name,
            turn,
            success = outcome.is_success(),
            "Tool call executed"
        );
        Ok(ToolCallRecord::new(call, outcome, turn, started.elapsed()).with_schema_valid(true))
    }
}
