//! Goal-shift recovery time
//!
//! Each shift is measured at three points, all relative to the user turn
//! that voiced it:
//!
//! - **ack**: first agent turn aligned with the new goal
//! - **tool**: first successful tool call at or after the trigger
//! - **outcome**: the turn at which the new goal resolved
//!
//! The headline recovery time of a shift is the outcome delta when the
//! agent both aligned and resolved; otherwise the shift is censored at the
//! turn budget.

use crate::goal::entities::{Goal, GoalId, ShiftKind};
use crate::tool::value_objects::ToolCallRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecovery {
    pub goal_id: GoalId,
    pub kind: ShiftKind,
    pub trigger_turn: usize,
    pub ack_turns: Option<usize>,
    pub tool_turns: Option<usize>,
    pub outcome_turns: Option<usize>,
    pub recovered: bool,
    /// Headline recovery time in turns
    pub turns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsrtSummary {
    pub shifts: Vec<ShiftRecovery>,
    pub mean_turns: f64,
    /// Mean turns divided by the turn budget, clamped to `[0, 1]`
    pub normalized: f64,
    /// `1 - normalized`; higher is better
    pub score: f64,
    pub median_ack: Option<f64>,
    pub median_tool: Option<f64>,
    pub median_outcome: Option<f64>,
    pub recovery_rate: f64,
    pub never_recovered_rate: f64,
}

fn median(mut values: Vec<usize>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    } else {
        values[mid] as f64
    })
}

/// Recovery of one shifted-into goal
pub fn shift_recovery(goal: &Goal, tool_calls: &[ToolCallRecord], turn_budget: usize) -> Option<ShiftRecovery> {
    let trigger = goal.trigger_turn?;
    let ack_turns = goal.aligned_turn.map(|t| t.saturating_sub(trigger));
    let tool_turns = tool_calls
        .iter()
        .filter(|r| r.turn >= trigger && r.is_success())
        .map(|r| r.turn - trigger)
        .min();
    let outcome_turns = goal.resolved_turn.map(|t| t.saturating_sub(trigger));
    let recovered = ack_turns.is_some();
    let turns = match (recovered, outcome_turns) {
        (true, Some(outcome)) => outcome,
        _ => turn_budget.saturating_sub(trigger),
    };
    Some(ShiftRecovery {
        goal_id: goal.id().clone(),
        kind: goal.shift_kind,
        trigger_turn: trigger,
        ack_turns,
        tool_turns,
        outcome_turns,
        recovered,
        turns,
    })
}

/// Summarize every recorded shift; `None` when the episode had no shift.
pub fn goal_shift_recovery(
    goals: &[Goal],
    tool_calls: &[ToolCallRecord],
    turn_budget: usize,
) -> Option<GsrtSummary> {
    let shifts: Vec<ShiftRecovery> = goals
        .iter()
        .filter_map(|g| shift_recovery(g, tool_calls, turn_budget))
        .collect();
    if shifts.is_empty() {
        return None;
    }

    let count = shifts.len() as f64;
    let mean_turns = shifts.iter().map(|s| s.turns as f64).sum::<f64>() / count;
    let normalized = if turn_budget == 0 {
        1.0
    } else {
        (mean_turns / turn_budget as f64).clamp(0.0, 1.0)
    };
    let recovery_rate = shifts.iter().filter(|s| s.recovered).count() as f64 / count;

    Some(GsrtSummary {
        median_ack: median(shifts.iter().filter_map(|s| s.ack_turns).collect()),
        median_tool: median(shifts.iter().filter_map(|s| s.tool_turns).collect()),
        median_outcome: median(shifts.iter().filter_map(|s| s.outcome_turns).collect()),
        shifts,
        mean_turns,
        normalized,
        score: 1.0 - normalized,
        recovery_rate,
        never_recovered_rate: 1.0 - recovery_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::entities::{GoalSpec, GoalStatus};
    use crate::goal::predicate::SuccessPredicate;
    use crate::tool::entities::ToolCall;
    use crate::tool::value_objects::{ToolError, ToolOutcome};
    use serde_json::json;
    use std::time::Duration;

    fn shifted_goal(trigger: usize, aligned: Option<usize>, resolved: Option<usize>) -> Goal {
        let mut goal = Goal::new(GoalSpec::new("g2", "waitlist", "d", SuccessPredicate::tool_succeeded("t")));
        goal.shift_kind = ShiftKind::Soft;
        goal.trigger_turn = Some(trigger);
        goal.activated_turn = Some(trigger);
        goal.aligned_turn = aligned;
        goal.resolved_turn = resolved;
        goal.status = if resolved.is_some() {
            GoalStatus::Resolved
        } else {
            GoalStatus::Abandoned
        };
        goal
    }

    fn call(turn: usize, ok: bool) -> ToolCallRecord {
        let outcome = if ok {
            ToolOutcome::Success(json!({}))
        } else {
            ToolError::not_found("x").into()
        };
        ToolCallRecord::new(ToolCall::new("t"), outcome, turn, Duration::ZERO)
    }

    #[test]
    fn test_no_shift_is_undefined() {
        let mut first = shifted_goal(3, None, None);
        first.trigger_turn = None;
        assert!(goal_shift_recovery(&[first], &[], 10).is_none());
    }

    #[test]
    fn test_recovered_shift_uses_outcome_point() {
        let goals = [shifted_goal(3, Some(4), Some(6))];
        let calls = [call(2, true), call(4, false), call(6, true)];
        let summary = goal_shift_recovery(&goals, &calls, 12).unwrap();
        let shift = &summary.shifts[0];
        assert_eq!(shift.ack_turns, Some(1));
        assert_eq!(shift.tool_turns, Some(3));
        assert_eq!(shift.outcome_turns, Some(3));
        assert_eq!(shift.turns, 3);
        assert_eq!(summary.mean_turns, 3.0);
        assert!((summary.score - 0.75).abs() < 1e-9);
        assert_eq!(summary.recovery_rate, 1.0);
    }

    #[test]
    fn test_unrecovered_shift_is_censored_at_budget() {
        let goals = [shifted_goal(5, None, Some(8)), shifted_goal(3, Some(4), None)];
        let summary = goal_shift_recovery(&goals, &[], 10).unwrap();
        assert_eq!(summary.shifts[0].turns, 5);
        assert_eq!(summary.shifts[1].turns, 7);
        assert_eq!(summary.recovery_rate, 0.5);
        assert_eq!(summary.never_recovered_rate, 0.5);
        assert!(summary.shifts.iter().all(|s| s.turns <= 10));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![3, 1, 2]), Some(2.0));
        assert_eq!(median(vec![4, 1, 2, 3]), Some(2.5));
    }
}
