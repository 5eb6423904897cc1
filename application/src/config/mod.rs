//! Application-level configuration.
//!
//! - [`EvaluationConfig`] - agent timeout, score weights, rubrics, batch control
//! - [`BatchParams`] - parallelism, trials and seeds for batch runs

pub mod evaluation_config;

pub use evaluation_config::{BatchParams, EvaluationConfig};
