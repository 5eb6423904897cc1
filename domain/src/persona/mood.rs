//! Persona mood
//!
//! Mood is driven by the count of consecutive agent turns that failed to
//! resolve anything the user wanted. It only moves forward; the single way
//! back to [`Mood::Calm`] is a resolution.

use super::entities::Persona;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Calm,
    Frustrated,
    Escalated,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Calm => "calm",
            Mood::Frustrated => "frustrated",
            Mood::Escalated => "escalated",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unmet-expectation counter with persona-specific thresholds
#[derive(Debug, Clone)]
pub struct MoodTracker {
    mood: Mood,
    unmet: u32,
    frustrate_after: u32,
    escalate_after: u32,
}

impl MoodTracker {
    pub fn new(frustrate_after: u32, escalate_after: u32) -> Self {
        let frustrate_after = frustrate_after.max(1);
        Self {
            mood: Mood::Calm,
            unmet: 0,
            frustrate_after,
            escalate_after: escalate_after.max(frustrate_after),
        }
    }

    /// Thresholds adjusted for the persona's traits.
    ///
    /// Low patience halves both thresholds (never below one turn). High
    /// confrontation brings escalation one turn closer to frustration.
    pub fn for_persona(persona: &Persona) -> Self {
        let policy = &persona.policy;
        let mut frustrate = policy.frustration_after;
        let mut escalate = policy.escalation_after;
        if persona.traits.patience < policy.low_threshold {
            frustrate = (frustrate / 2).max(1);
            escalate = (escalate / 2).max(1);
        }
        if persona.traits.confrontation >= policy.high_threshold {
            escalate = escalate.saturating_sub(1);
        }
        Self::new(frustrate, escalate)
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn unmet(&self) -> u32 {
        self.unmet
    }

    pub fn thresholds(&self) -> (u32, u32) {
        (self.frustrate_after, self.escalate_after)
    }

    /// Count one more agent turn that resolved nothing
    pub fn record_unmet(&mut self) -> Mood {
        self.unmet += 1;
        let reached = if self.unmet >= self.escalate_after {
            Mood::Escalated
        } else if self.unmet >= self.frustrate_after {
            Mood::Frustrated
        } else {
            Mood::Calm
        };
        self.mood = self.mood.max(reached);
        self.mood
    }

    /// The agent resolved a goal
    pub fn reset(&mut self) {
        self.unmet = 0;
        self.mood = Mood::Calm;
    }
}
