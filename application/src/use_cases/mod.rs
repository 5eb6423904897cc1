//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod run_batch;
pub mod run_episode;
pub mod score_episode;
pub(crate) mod shared;
pub mod tool_mediator;
#[cfg(test)]
pub(crate) mod test_support;
