//! Metrics domain module
//!
//! Post-hoc scoring of a finished episode on four independent axes:
//!
//! | Axis | Measures | Range |
//! |------|----------|-------|
//! | **TSR** | share of goals whose success predicate held | `[0, 1]` |
//! | **GSRT** | turns from a goal shift to its recovery (`None` without shifts) | `[0, 1]` as `1 - normalized` |
//! | **CommQuality** | clarity, tone, persona consistency, self-contradiction | `[0, 1]` |
//! | **ActionExec** | valid call fraction minus redundancy (TCRR) | `[0, 1]` |
//!
//! The aggregate is a weighted mean with externally supplied [`ScoreWeights`].

pub mod action_exec;
pub mod comm_quality;
pub mod engine;
pub mod gsrt;
pub mod pass_hat_k;
pub mod scorecard;
pub mod tsr;

pub use action_exec::{ActionExecBreakdown, RedundancyParams, TcrrResult};
pub use comm_quality::{CommBreakdown, CommCheck, CommRubric, CommViolation};
pub use engine::{EpisodeEvidence, MetricsEngine};
pub use gsrt::{GsrtSummary, ShiftRecovery};
pub use pass_hat_k::pass_hat_k;
pub use scorecard::{ScoreCard, ScoreWeights};
pub use tsr::{GoalOutcome, TsrBreakdown};
