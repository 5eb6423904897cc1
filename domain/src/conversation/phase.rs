//! Orchestrator phases and termination

use serde::{Deserialize, Serialize};

/// Why an episode stopped before every goal was settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    /// The agent adapter did not answer within the configured timeout
    AgentTimeout { turn: usize },
    TurnBudgetExceeded,
    DomainDataError(String),
    AdapterFailure(String),
    Cancelled,
    /// The episode task itself failed (panic inside the runtime)
    EpisodePanicked(String),
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::AgentTimeout { .. } => "agent_timeout",
            AbortReason::TurnBudgetExceeded => "turn_budget_exceeded",
            AbortReason::DomainDataError(_) => "domain_data_error",
            AbortReason::AdapterFailure(_) => "adapter_failure",
            AbortReason::Cancelled => "cancelled",
            AbortReason::EpisodePanicked(_) => "episode_panicked",
        }
    }

    /// Whether the episode still produced a complete scorecard
    pub fn is_complete(&self) -> bool {
        matches!(self, AbortReason::TurnBudgetExceeded)
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::AgentTimeout { turn } => write!(f, "agent timed out at turn {}", turn),
            AbortReason::TurnBudgetExceeded => write!(f, "turn budget exceeded"),
            AbortReason::DomainDataError(msg) => write!(f, "domain data error: {}", msg),
            AbortReason::AdapterFailure(msg) => write!(f, "adapter failure: {}", msg),
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::EpisodePanicked(msg) => write!(f, "episode panicked: {}", msg),
        }
    }
}

/// Phase of the conversation state machine
///
/// ```text
/// Init → UserTurn → AgentTurn → ToolExchange → ShiftCheck ─┬→ UserTurn
///                                                          ├→ Resolved
///                                                          └→ Aborted(reason)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Init,
    UserTurn,
    AgentTurn,
    ToolExchange,
    ShiftCheck,
    Resolved,
    Aborted(AbortReason),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Init => "init",
            Phase::UserTurn => "user_turn",
            Phase::AgentTurn => "agent_turn",
            Phase::ToolExchange => "tool_exchange",
            Phase::ShiftCheck => "shift_check",
            Phase::Resolved => "resolved",
            Phase::Aborted(_) => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Resolved | Phase::Aborted(_))
    }

    /// Terminal state of a finished phase
    pub fn termination(&self) -> Option<Termination> {
        match self {
            Phase::Resolved => Some(Termination::Resolved),
            Phase::Aborted(reason) => Some(Termination::Aborted(reason.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an episode ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Resolved,
    Aborted(AbortReason),
}

impl Termination {
    pub fn is_complete(&self) -> bool {
        match self {
            Termination::Resolved => true,
            Termination::Aborted(reason) => reason.is_complete(),
        }
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Termination::Aborted(reason) => Some(reason),
            Termination::Resolved => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::Resolved => "resolved",
            Termination::Aborted(reason) => reason.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness_by_reason() {
        assert!(Termination::Resolved.is_complete());
        assert!(Termination::Aborted(AbortReason::TurnBudgetExceeded).is_complete());
        assert!(!Termination::Aborted(AbortReason::AgentTimeout { turn: 4 }).is_complete());
        assert!(!Termination::Aborted(AbortReason::Cancelled).is_complete());
        assert!(!Termination::Aborted(AbortReason::AdapterFailure("eof".into())).is_complete());
        assert!(!Termination::Aborted(AbortReason::DomainDataError("x".into())).is_complete());
    }

    #[test]
    fn test_phase_termination() {
        assert!(Phase::ShiftCheck.termination().is_none());
        assert!(!Phase::UserTurn.is_terminal());
        let phase = Phase::Aborted(AbortReason::Cancelled);
        assert!(phase.is_terminal());
        assert_eq!(
            phase.termination(),
            Some(Termination::Aborted(AbortReason::Cancelled))
        );
    }

    #[test]
    fn test_abort_reason_serialization() {
        let value = serde_json::to_value(AbortReason::AgentTimeout { turn: 4 }).unwrap();
        assert_eq!(value["reason"], "agent_timeout");
        assert_eq!(value["detail"]["turn"], 4);
    }
}
