//! Task success rate

use crate::goal::entities::{Goal, GoalId};
use crate::goal::predicate::PredicateView;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalOutcome {
    pub goal_id: GoalId,
    pub success: bool,
    /// Set when the predicate could not be evaluated against the pack data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsrBreakdown {
    pub goals: Vec<GoalOutcome>,
    pub score: f64,
}

impl TsrBreakdown {
    pub fn has_errors(&self) -> bool {
        self.goals.iter().any(|g| g.error.is_some())
    }

    pub fn all_succeeded(&self) -> bool {
        !self.goals.is_empty() && self.goals.iter().all(|g| g.success)
    }
}

/// Evaluate every goal's success predicate over events since its activation.
///
/// Goals that were never activated count as failed.
pub fn task_success_rate(goals: &[Goal], view: &PredicateView<'_>) -> TsrBreakdown {
    let outcomes: Vec<GoalOutcome> = goals
        .iter()
        .map(|goal| {
            let Some(since) = goal.activated_turn else {
                return GoalOutcome {
                    goal_id: goal.id().clone(),
                    success: false,
                    error: None,
                };
            };
            let scoped = PredicateView {
                turns: view.turns,
                tool_calls: view.tool_calls,
                records: view.records,
                since_turn: since,
            };
            match goal.spec.success.evaluate(&scoped) {
                Ok(success) => GoalOutcome {
                    goal_id: goal.id().clone(),
                    success,
                    error: None,
                },
                Err(e) => GoalOutcome {
                    goal_id: goal.id().clone(),
                    success: false,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    let score = if outcomes.is_empty() {
        0.0
    } else {
        outcomes.iter().filter(|o| o.success).count() as f64 / outcomes.len() as f64
    };
    TsrBreakdown {
        goals: outcomes,
        score,
    }
}
