//! Score card and aggregate weights

use super::action_exec::ActionExecBreakdown;
use super::comm_quality::CommBreakdown;
use super::gsrt::GsrtSummary;
use super::tsr::TsrBreakdown;
use crate::conversation::phase::Termination;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Weights of the four axes in the aggregate score.
///
/// Has no `Default`; evaluations must state their weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub tsr: f64,
    pub gsrt: f64,
    pub comm_quality: f64,
    pub action_exec: f64,
}

impl ScoreWeights {
    pub fn new(tsr: f64, gsrt: f64, comm_quality: f64, action_exec: f64) -> Result<Self, DomainError> {
        let weights = Self {
            tsr,
            gsrt,
            comm_quality,
            action_exec,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Equal weight on every axis
    pub fn uniform() -> Self {
        Self {
            tsr: 0.25,
            gsrt: 0.25,
            comm_quality: 0.25,
            action_exec: 0.25,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let all = [
            ("tsr", self.tsr),
            ("gsrt", self.gsrt),
            ("comm_quality", self.comm_quality),
            ("action_exec", self.action_exec),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(DomainError::InvalidWeights(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
        if all.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(DomainError::InvalidWeights("weights sum to zero".to_string()));
        }
        Ok(())
    }

    /// Weighted mean over the defined axes, renormalized when GSRT is undefined
    pub fn aggregate(&self, tsr: f64, gsrt: Option<f64>, comm_quality: f64, action_exec: f64) -> f64 {
        let mut parts = vec![
            (self.tsr, tsr),
            (self.comm_quality, comm_quality),
            (self.action_exec, action_exec),
        ];
        if let Some(gsrt) = gsrt {
            parts.push((self.gsrt, gsrt));
        }
        let total: f64 = parts.iter().map(|(w, _)| w).sum();
        if total <= 0.0 {
            return 0.0;
        }
        parts.iter().map(|(w, v)| w * v).sum::<f64>() / total
    }
}

/// Final, immutable result of scoring one episode.
///
/// Only the metrics engine builds score cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    task_id: String,
    termination: Termination,
    complete: bool,
    tsr: f64,
    gsrt: Option<f64>,
    comm_quality: f64,
    action_exec: f64,
    aggregate: f64,
    tsr_breakdown: TsrBreakdown,
    gsrt_breakdown: Option<GsrtSummary>,
    comm_breakdown: CommBreakdown,
    action_breakdown: ActionExecBreakdown,
}

pub(crate) struct ScoreCardParts {
    pub task_id: String,
    pub termination: Termination,
    pub complete: bool,
    pub aggregate: f64,
    pub tsr: TsrBreakdown,
    pub gsrt: Option<GsrtSummary>,
    pub comm: CommBreakdown,
    pub action: ActionExecBreakdown,
}

impl ScoreCard {
    pub(crate) fn from_parts(parts: ScoreCardParts) -> Self {
        Self {
            task_id: parts.task_id,
            termination: parts.termination,
            complete: parts.complete,
            tsr: parts.tsr.score,
            gsrt: parts.gsrt.as_ref().map(|g| g.score),
            comm_quality: parts.comm.score,
            action_exec: parts.action.score,
            aggregate: parts.aggregate,
            tsr_breakdown: parts.tsr,
            gsrt_breakdown: parts.gsrt,
            comm_breakdown: parts.comm,
            action_breakdown: parts.action,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    /// `false` when the episode was cut short by a timeout, cancellation,
    /// adapter failure or missing pack data
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn tsr(&self) -> f64 {
        self.tsr
    }

    /// GSRT axis score (`1 - normalized recovery time`), if any shift happened
    pub fn gsrt(&self) -> Option<f64> {
        self.gsrt
    }

    /// Mean headline recovery time in turns, if any shift happened
    pub fn gsrt_turns(&self) -> Option<f64> {
        self.gsrt_breakdown.as_ref().map(|g| g.mean_turns)
    }

    pub fn comm_quality(&self) -> f64 {
        self.comm_quality
    }

    pub fn action_exec(&self) -> f64 {
        self.action_exec
    }

    pub fn aggregate(&self) -> f64 {
        self.aggregate
    }

    pub fn tsr_breakdown(&self) -> &TsrBreakdown {
        &self.tsr_breakdown
    }

    pub fn gsrt_breakdown(&self) -> Option<&GsrtSummary> {
        self.gsrt_breakdown.as_ref()
    }

    pub fn comm_breakdown(&self) -> &CommBreakdown {
        &self.comm_breakdown
    }

    pub fn action_breakdown(&self) -> &ActionExecBreakdown {
        &self.action_breakdown
    }

    /// Every goal's success predicate held
    pub fn is_success(&self) -> bool {
        self.tsr_breakdown.all_succeeded()
    }
}
