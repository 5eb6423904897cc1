//! Action execution quality and tool-call redundancy (TCRR)
//!
//! TCRR counts two kinds of redundant calls, identified by tool name plus
//! normalized arguments:
//!
//! - window-redundant: identical to a call made in one of the previous
//!   `window_size` agent turns
//! - batch-redundant: identical calls within one agent turn beyond
//!   `batch_threshold` (only the excess counts)

use crate::tool::value_objects::ToolCallRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedundancyParams {
    pub window_size: usize,
    pub batch_threshold: usize,
    /// Weight of TCRR subtracted from the valid-call fraction
    pub penalty: f64,
}

impl Default for RedundancyParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            batch_threshold: 2,
            penalty: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcrrResult {
    pub total_calls: usize,
    pub window_redundant: usize,
    pub batch_redundant: usize,
    /// Redundant calls keyed by agent-turn ordinal (1-based)
    pub redundant_by_turn: BTreeMap<usize, usize>,
    pub ratio: f64,
}

impl TcrrResult {
    pub fn redundant_calls(&self) -> usize {
        self.window_redundant + self.batch_redundant
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionExecBreakdown {
    pub total_calls: usize,
    pub well_formed_calls: usize,
    pub schema_invalid: usize,
    pub precondition_violations: usize,
    pub valid_fraction: f64,
    pub tcrr: TcrrResult,
    pub score: f64,
}

/// Windowed redundancy over a tool-call history.
///
/// `agent_turns` are the transcript indices of agent turns, ascending; they
/// map each call's turn index onto an agent-turn ordinal.
pub fn tool_call_redundancy(
    tool_calls: &[ToolCallRecord],
    agent_turns: &[usize],
    params: &RedundancyParams,
) -> TcrrResult {
    let mut by_turn: BTreeMap<usize, Vec<(String, String)>> = BTreeMap::new();
    for record in tool_calls {
        let ordinal = agent_turns.partition_point(|&t| t < record.turn) + 1;
        by_turn.entry(ordinal).or_default().push(record.call.identity());
    }

    let mut window_redundant = 0;
    let mut batch_redundant = 0;
    let mut redundant_by_turn = BTreeMap::new();

    for (&ordinal, calls) in &by_turn {
        let start = ordinal.saturating_sub(params.window_size).max(1);
        let previous: HashSet<&(String, String)> = by_turn
            .range(start..ordinal)
            .flat_map(|(_, prev)| prev.iter())
            .collect();

        let mut redundant = calls.iter().filter(|id| previous.contains(id)).count();
        window_redundant += redundant;

        let mut counts: HashMap<&(String, String), usize> = HashMap::new();
        for identity in calls {
            *counts.entry(identity).or_default() += 1;
        }
        let excess: usize = counts
            .values()
            .map(|&n| n.saturating_sub(params.batch_threshold))
            .sum();
        batch_redundant += excess;
        redundant += excess;

        redundant_by_turn.insert(ordinal, redundant);
    }

    let total_calls = tool_calls.len();
    let ratio = if total_calls == 0 {
        0.0
    } else {
        (window_redundant + batch_redundant) as f64 / total_calls as f64
    };
    TcrrResult {
        total_calls,
        window_redundant,
        batch_redundant,
        redundant_by_turn,
        ratio,
    }
}

/// `valid_fraction - penalty * TCRR`, clamped to `[0, 1]`; 1.0 without calls.
pub fn action_execution(
    tool_calls: &[ToolCallRecord],
    agent_turns: &[usize],
    params: &RedundancyParams,
) -> ActionExecBreakdown {
    let tcrr = tool_call_redundancy(tool_calls, agent_turns, params);
    let total_calls = tool_calls.len();
    let well_formed_calls = tool_calls.iter().filter(|r| r.is_well_formed()).count();
    let schema_invalid = tool_calls.iter().filter(|r| !r.schema_valid).count();
    let precondition_violations = tool_calls.iter().filter(|r| !r.precondition_ok).count();

    let (valid_fraction, score) = if total_calls == 0 {
        (1.0, 1.0)
    } else {
        let valid = well_formed_calls as f64 / total_calls as f64;
        (valid, (valid - params.penalty * tcrr.ratio).clamp(0.0, 1.0))
    };

    ActionExecBreakdown {
        total_calls,
        well_formed_calls,
        schema_invalid,
        precondition_violations,
        valid_fraction,
        tcrr,
        score,
    }
}
