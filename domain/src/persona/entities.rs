//! Persona entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Behavioural traits of a simulated user, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitVector {
    pub patience: f64,
    pub suspicion: f64,
    pub curiosity: f64,
    pub confrontation: f64,
}

impl TraitVector {
    pub fn neutral() -> Self {
        Self {
            patience: 0.5,
            suspicion: 0.5,
            curiosity: 0.5,
            confrontation: 0.5,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let traits = [
            ("patience", self.patience),
            ("suspicion", self.suspicion),
            ("curiosity", self.curiosity),
            ("confrontation", self.confrontation),
        ];
        for (name, value) in traits {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidPersona(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Thresholds that turn traits into dialogue behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialoguePolicy {
    /// A trait at or above this value counts as high
    pub high_threshold: f64,
    /// A trait below this value counts as low
    pub low_threshold: f64,
    pub max_digressions_per_goal: u32,
    /// Unmet agent turns before the persona becomes frustrated
    pub frustration_after: u32,
    /// Unmet agent turns before the persona escalates
    pub escalation_after: u32,
}

impl Default for DialoguePolicy {
    fn default() -> Self {
        Self {
            high_threshold: 0.7,
            low_threshold: 0.3,
            max_digressions_per_goal: 1,
            frustration_after: 2,
            escalation_after: 4,
        }
    }
}

/// A simulated user profile from a domain pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub traits: TraitVector,
    #[serde(default)]
    pub policy: DialoguePolicy,
    /// Name the persona uses when introducing itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Persona {
    pub fn new(id: impl Into<String>, traits: TraitVector) -> Self {
        Self {
            id: id.into(),
            traits,
            policy: DialoguePolicy::default(),
            display_name: None,
        }
    }

    pub fn with_policy(mut self, policy: DialoguePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_high(&self, value: f64) -> bool {
        value >= self.policy.high_threshold
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.traits
            .validate()
            .map_err(|e| DomainError::InvalidPersona(format!("{}: {}", self.id, e)))?;
        let policy = &self.policy;
        if policy.low_threshold > policy.high_threshold {
            return Err(DomainError::InvalidPersona(format!(
                "{}: low threshold {} exceeds high threshold {}",
                self.id, policy.low_threshold, policy.high_threshold
            )));
        }
        Ok(())
    }
}
