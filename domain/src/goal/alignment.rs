//! Detection of agent turns aligned with a shifted-into goal
//!
//! | Shift | Aligned when the agent turn contains |
//! |-------|--------------------------------------|
//! | soft  | a sentence opening with an acknowledgment phrase, or any goal keyword |
//! | hard  | every goal keyword (the category name when none are declared) |

use super::entities::{Goal, ShiftKind};
use crate::core::text::{contains_all, contains_any, contains_phrase, humanize, opens_with_any};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentRule {
    pub ack_phrases: Vec<String>,
}

impl Default for AlignmentRule {
    fn default() -> Self {
        Self {
            ack_phrases: [
                "sure",
                "of course",
                "no problem",
                "absolutely",
                "got it",
                "understood",
                "happy to help",
                "i can help with that",
                "let me look into",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AlignmentRule {
    pub fn is_aligned(&self, goal: &Goal, agent_content: &str) -> bool {
        let keywords = &goal.spec.keywords;
        match goal.shift_kind {
            ShiftKind::None => true,
            ShiftKind::Soft => {
                opens_with_any(agent_content, &self.ack_phrases) || contains_any(agent_content, keywords)
            }
            ShiftKind::Hard if keywords.is_empty() => {
                contains_phrase(agent_content, &humanize(goal.category()))
            }
            ShiftKind::Hard => contains_all(agent_content, keywords),
        }
    }
}
