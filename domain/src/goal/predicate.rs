//! Per-goal success predicates
//!
//! Predicates are pack data. They are evaluated twice: live by the
//! orchestrator after every agent turn (to resolve goals and drive the
//! persona), and post-hoc by the metrics engine for TSR.

use crate::conversation::entities::{Role, Turn};
use crate::core::error::DomainError;
use crate::core::text::contains_all;
use crate::tool::records::RecordView;
use crate::tool::value_objects::ToolCallRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Condition under which a goal counts as achieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuccessPredicate {
    /// A successful call to `tool` whose arguments include every pair in `args`
    ToolSucceeded {
        tool: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// The task-local data state holds `value` at `collection[key].field`
    RecordEquals {
        collection: String,
        key: String,
        field: String,
        value: Value,
    },
    /// One agent turn contains every phrase
    AgentSays { phrases: Vec<String> },
    All { of: Vec<SuccessPredicate> },
    Any { of: Vec<SuccessPredicate> },
}

/// Evidence a predicate is evaluated against
pub struct PredicateView<'a> {
    pub turns: &'a [Turn],
    pub tool_calls: &'a [ToolCallRecord],
    pub records: &'a dyn RecordView,
    /// Events before this turn are ignored
    pub since_turn: usize,
}

impl SuccessPredicate {
    pub fn tool_succeeded(tool: impl Into<String>) -> Self {
        SuccessPredicate::ToolSucceeded {
            tool: tool.into(),
            args: Map::new(),
        }
    }

    pub fn agent_says(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        SuccessPredicate::AgentSays {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate against the given evidence.
    ///
    /// Fails only when the predicate references a collection the pack lacks.
    pub fn evaluate(&self, view: &PredicateView<'_>) -> Result<bool, DomainError> {
        match self {
            SuccessPredicate::ToolSucceeded { tool, args } => Ok(view
                .tool_calls
                .iter()
                .filter(|r| r.turn >= view.since_turn && r.is_success())
                .any(|r| r.call.tool_name == *tool && args_match(&r.call.arguments, args))),
            SuccessPredicate::RecordEquals {
                collection,
                key,
                field,
                value,
            } => {
                if !view.records.has_collection(collection) {
                    return Err(DomainError::missing_collection(collection));
                }
                Ok(view
                    .records
                    .get(collection, key)
                    .and_then(|record| record.get(field))
                    .is_some_and(|actual| actual == value))
            }
            SuccessPredicate::AgentSays { phrases } => Ok(view
                .turns
                .iter()
                .filter(|t| t.role == Role::Agent && t.index >= view.since_turn)
                .any(|t| contains_all(&t.content, phrases))),
            SuccessPredicate::All { of } => {
                for predicate in of {
                    if !predicate.evaluate(view)? {
                        return Ok(false);
                    }
                }
                Ok(!of.is_empty())
            }
            SuccessPredicate::Any { of } => {
                for predicate in of {
                    if predicate.evaluate(view)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn args_match(actual: &std::collections::HashMap<String, Value>, expected: &Map<String, Value>) -> bool {
    expected
        .iter()
        .all(|(key, value)| actual.get(key).is_some_and(|v| v == value))
}
