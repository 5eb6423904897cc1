//! Communication quality rubric over agent turns

use crate::conversation::entities::Transcript;
use crate::core::text::{contains_any, truncate};
use crate::tool::value_objects::ToolCallRecord;
use serde::{Deserialize, Serialize};

/// Phrases and limits the rubric checks agent turns against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommRubric {
    /// Agent turns longer than this (in characters) are unclear
    pub max_turn_chars: usize,
    /// Discourteous phrases
    pub banned_phrases: Vec<String>,
    /// Phrases that show the agent speaking as the user or customer
    pub user_voice_phrases: Vec<String>,
    /// Phrases that claim an action succeeded
    pub success_claims: Vec<String>,
    /// Score lost per violation
    pub penalty: f64,
}

impl Default for CommRubric {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            max_turn_chars: 1200,
            banned_phrases: strings(&[
                "calm down",
                "not my problem",
                "as i already told you",
                "obviously",
                "stupid",
            ]),
            user_voice_phrases: strings(&[
                "as the customer",
                "i am the customer",
                "i'm the customer",
                "speaking as the user",
                "as a student, i want",
            ]),
            success_claims: strings(&[
                "successfully",
                "has been completed",
                "is confirmed",
                "you're all set",
                "you are all set",
            ]),
            penalty: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommCheck {
    Clarity,
    Tone,
    PersonaConsistency,
    SelfContradiction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommViolation {
    pub turn: usize,
    pub check: CommCheck,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommBreakdown {
    pub agent_turns: usize,
    pub violations: Vec<CommViolation>,
    pub score: f64,
}

impl CommBreakdown {
    pub fn count(&self, check: CommCheck) -> usize {
        self.violations.iter().filter(|v| v.check == check).count()
    }
}

pub fn communication_quality(
    transcript: &Transcript,
    tool_calls: &[ToolCallRecord],
    rubric: &CommRubric,
) -> CommBreakdown {
    let mut violations = Vec::new();
    let mut agent_turns = 0;

    for turn in transcript.agent_turns() {
        agent_turns += 1;
        let content = turn.content.trim();
        let mut flag = |check, detail: String| {
            violations.push(CommViolation {
                turn: turn.index,
                check,
                detail,
            })
        };

        if content.is_empty() {
            flag(CommCheck::Clarity, "empty reply".to_string());
        } else if content.chars().count() > rubric.max_turn_chars {
            flag(
                CommCheck::Clarity,
                format!("reply exceeds {} characters", rubric.max_turn_chars),
            );
        }
        if contains_any(content, &rubric.banned_phrases) {
            flag(CommCheck::Tone, truncate(content, 80));
        }
        if contains_any(content, &rubric.user_voice_phrases) {
            flag(CommCheck::PersonaConsistency, truncate(content, 80));
        }

        let mut issued = tool_calls.iter().filter(|r| r.turn == turn.index).peekable();
        if issued.peek().is_some()
            && issued.all(|r| !r.is_success())
            && contains_any(content, &rubric.success_claims)
        {
            flag(
                CommCheck::SelfContradiction,
                "claims success although every tool call failed".to_string(),
            );
        }
    }

    let score = (1.0 - rubric.penalty * violations.len() as f64).max(0.0);
    CommBreakdown {
        agent_turns,
        violations,
        score,
    }
}
