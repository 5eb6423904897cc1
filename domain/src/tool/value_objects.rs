//! Tool domain value objects - immutable result and error types
//!
//! Every call the agent issues ends up as a [`ToolCallRecord`] in the
//! task's tool-call history, whether it executed or was rejected.
//!
//! | Kind | Raised when | Scoring flag |
//! |------|-------------|--------------|
//! | `InvalidArgs` | schema violation (missing/extra/mistyped/out-of-domain arg) | `schema_valid = false` |
//! | `NotFound` | unknown tool (`schema_valid = false`) or missing record | - |
//! | `PrereqUnmet` | ordering precondition not satisfied | `precondition_ok = false` |
//! | `Unauthorized` | tool needs an authenticated customer | `precondition_ok = false` |

use super::entities::ToolCall;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error kinds the tool mediator reports back to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidArgs,
    NotFound,
    PrereqUnmet,
    Unauthorized,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorKind::InvalidArgs => "INVALID_ARGS",
            ToolErrorKind::NotFound => "NOT_FOUND",
            ToolErrorKind::PrereqUnmet => "PREREQ_UNMET",
            ToolErrorKind::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured rejection of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArgs, message)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ToolErrorKind::NotFound,
            format!("Resource not found: {}", resource.into()),
        )
    }

    pub fn prereq_unmet(tool: &str, missing: &str) -> Self {
        Self::new(
            ToolErrorKind::PrereqUnmet,
            format!("'{}' requires a prior successful '{}' call", tool, missing),
        )
    }

    pub fn unauthorized(tool: &str) -> Self {
        Self::new(
            ToolErrorKind::Unauthorized,
            format!("'{}' requires an authenticated customer", tool),
        )
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Result or error of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(serde_json::Value),
    Failure { kind: ToolErrorKind, message: String },
}

impl From<ToolError> for ToolOutcome {
    fn from(error: ToolError) -> Self {
        ToolOutcome::Failure {
            kind: error.kind,
            message: error.message,
        }
    }
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            ToolOutcome::Failure { kind, .. } => Some(*kind),
            ToolOutcome::Success(_) => None,
        }
    }
}

/// Entry of the tool-call history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub call: ToolCall,
    pub outcome: ToolOutcome,
    /// Agent turn that issued the call
    pub turn: usize,
    #[serde(with = "duration_ms")]
    pub latency: Duration,
    /// The call matched the tool's declared schema
    pub schema_valid: bool,
    /// Ordering and authorization preconditions held
    pub precondition_ok: bool,
}

impl ToolCallRecord {
    /// Record with flags derived from the outcome
    pub fn new(call: ToolCall, outcome: ToolOutcome, turn: usize, latency: Duration) -> Self {
        let schema_valid = outcome.error_kind() != Some(ToolErrorKind::InvalidArgs);
        let precondition_ok = !matches!(
            outcome.error_kind(),
            Some(ToolErrorKind::PrereqUnmet | ToolErrorKind::Unauthorized)
        );
        Self {
            call,
            outcome,
            turn,
            latency,
            schema_valid,
            precondition_ok,
        }
    }

    pub fn with_schema_valid(mut self, schema_valid: bool) -> Self {
        self.schema_valid = schema_valid;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Counts toward ActionExec's valid fraction
    pub fn is_well_formed(&self) -> bool {
        self.schema_valid && self.precondition_ok
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::prereq_unmet("register_course", "check_prerequisites");
        assert_eq!(err.kind, ToolErrorKind::PrereqUnmet);
        assert!(err.to_string().starts_with("[PREREQ_UNMET]"));
    }

    #[test]
    fn test_record_flags_follow_outcome() {
        let call = ToolCall::new("get_course");
        let ok = ToolCallRecord::new(call.clone(), ToolOutcome::Success(json!({})), 2, Duration::ZERO);
        assert!(ok.is_well_formed());
        assert!(ok.is_success());

        let invalid = ToolCallRecord::new(
            call.clone(),
            ToolError::invalid_args("missing course_id").into(),
            2,
            Duration::ZERO,
        );
        assert!(!invalid.schema_valid);
        assert!(invalid.precondition_ok);

        let unauthorized =
            ToolCallRecord::new(call.clone(), ToolError::unauthorized("get_course").into(), 2, Duration::ZERO);
        assert!(unauthorized.schema_valid);
        assert!(!unauthorized.precondition_ok);

        let missing = ToolCallRecord::new(call, ToolError::not_found("course X").into(), 2, Duration::ZERO);
        assert!(missing.is_well_formed());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_record_serializes_latency_in_ms() {
        let record = ToolCallRecord::new(
            ToolCall::new("get_course"),
            ToolOutcome::Success(json!({"id": 1})),
            4,
            Duration::from_millis(120),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["latency"], 120);
        assert_eq!(value["outcome"]["status"], "success");
    }
}
