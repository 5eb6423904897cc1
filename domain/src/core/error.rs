//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Only [`DomainError::DomainData`] can end an episode early; the other
/// variants surface while a pack or task is being validated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// The pack lacks a record, collection, or persona the task expects.
    #[error("Domain data error: {0}")]
    DomainData(String),

    #[error("Invalid persona: {0}")]
    InvalidPersona(String),

    #[error("Invalid task definition: {0}")]
    InvalidTask(String),

    #[error("Invalid tool schema: {0}")]
    InvalidToolSchema(String),

    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Check if this error is fatal to the running task only
    pub fn is_domain_data(&self) -> bool {
        matches!(self, DomainError::DomainData(_))
    }

    pub fn missing_collection(collection: &str) -> Self {
        DomainError::DomainData(format!("collection '{}' is not present in the pack", collection))
    }
}
