//! Tool domain module
//!
//! The tools a domain pack exposes to the agent under test, and the records
//! those tools read and write.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌────────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolCallRecord │
//! │ (registry)   │    │ (agent)      │    │ (history)      │
//! └──────┬───────┘    └──────────────┘    └────────────────┘
//!        │
//!        └─ ToolEffect ──▶ RecordStore + RecordOverlay
//! ```
//!
//! | Access | Behaviour |
//! |--------|-----------|
//! | **Read** | idempotent; identical calls return identical results until the collection is written |
//! | **Write** | applies an [`ToolEffect`] to the task-local [`RecordOverlay`] |
//!
//! # Key Types
//!
//! - [`ToolSpec`] - Registry of a pack's tools
//! - [`ToolDefinition`] - Name, access, parameters, effect, preconditions
//! - [`ToolCall`] - An invocation with arguments
//! - [`ToolCallRecord`] - Call plus outcome, turn, latency and scoring flags
//! - [`ToolValidator`] - Pure schema validation
//! - [`RecordStore`] / [`RecordOverlay`] - Pack records and per-task writes

pub mod entities;
pub mod records;
pub mod traits;
pub mod value_objects;

pub use entities::{
    ParamType, ToolAccess, ToolCall, ToolDefinition, ToolEffect, ToolParameter, ToolSpec,
    normalized_args,
};
pub use records::{RecordOverlay, RecordStore, RecordView, TaskRecords, execute_effect};
pub use traits::{SchemaValidator, ToolValidator};
pub use value_objects::{ToolCallRecord, ToolError, ToolErrorKind, ToolOutcome};
