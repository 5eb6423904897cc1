//! Goal domain module
//!
//! Goals are what the simulated user wants from the agent. A task declares
//! them in order; the first is active from the start and later ones arrive
//! as **goal shifts** when their trigger fires.
//!
//! # Key Types
//!
//! - [`GoalSpec`] - Declared goal (category, keywords, success predicate, trigger)
//! - [`Goal`] - Runtime goal with status and shift bookkeeping
//! - [`GoalSequencer`] - Goal stack, shift injection, resolution, finalization
//! - [`AdjacencyTable`] - Soft/hard classification by category adjacency
//! - [`AlignmentRule`] - Whether an agent turn acknowledges or replans for a shift
//! - [`SuccessPredicate`] - Data-driven success condition

pub mod adjacency;
pub mod alignment;
pub mod entities;
pub mod predicate;
pub mod sequencer;

pub use adjacency::AdjacencyTable;
pub use alignment::AlignmentRule;
pub use entities::{Goal, GoalId, GoalSpec, GoalStatus, ShiftEvent, ShiftKind, ShiftTrigger, TriggerContext};
pub use predicate::{PredicateView, SuccessPredicate};
pub use sequencer::GoalSequencer;
