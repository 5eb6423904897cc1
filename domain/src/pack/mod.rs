//! Domain pack module
//!
//! A [`DomainPack`] is pure data: policy text, backing records, tool schemas,
//! tasks, personas and the category adjacency table. It is loaded once and
//! shared read-only by every concurrently running task.

pub mod entities;

pub use entities::{DomainPack, TaskDefinition};
