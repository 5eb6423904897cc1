//! Persona engine: deterministic simulated user
//!
//! Given the same persona, seed and sequence of contexts the engine emits
//! the same utterances. All randomness comes from one seeded [`StdRng`].

use super::entities::Persona;
use super::mood::{Mood, MoodTracker};
use crate::goal::entities::{Goal, GoalId, ShiftEvent, ShiftKind};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Why the simulated user said what it said
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    Opening,
    ShiftRequest,
    Challenge,
    FollowUp,
    Digression,
    Escalation,
    Closing,
}

impl UserIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserIntent::Opening => "opening",
            UserIntent::ShiftRequest => "shift_request",
            UserIntent::Challenge => "challenge",
            UserIntent::FollowUp => "follow_up",
            UserIntent::Digression => "digression",
            UserIntent::Escalation => "escalation",
            UserIntent::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUtterance {
    pub content: String,
    pub intent: UserIntent,
}

/// Inputs for one user turn
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaContext<'a> {
    /// Top of the goal stack
    pub active_goal: Option<&'a Goal>,
    pub last_agent_turn: Option<&'a str>,
    /// Number of turns already in the log
    pub history_len: usize,
    /// Shift injected since the previous user turn, to be voiced now
    pub pending_shift: Option<&'a ShiftEvent>,
}

const DIGRESSIONS: &[&str] = &[
    "By the way, is there a way to get notified about changes like this?",
    "Out of curiosity, how long does this usually take?",
    "Unrelated, but do you keep a history of my past requests?",
];

const FOLLOW_UPS: &[&str] = &["Could you help me with this: {}", "I'm still hoping to {}.", "So, about {}?"];

pub struct PersonaEngine {
    persona: Persona,
    rng: StdRng,
    mood: MoodTracker,
    challenged: HashSet<GoalId>,
    digressions: HashMap<GoalId, u32>,
}

impl PersonaEngine {
    pub fn new(persona: Persona, seed: u64) -> Self {
        let mood = MoodTracker::for_persona(&persona);
        Self {
            persona,
            rng: StdRng::seed_from_u64(seed),
            mood,
            challenged: HashSet::new(),
            digressions: HashMap::new(),
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn mood(&self) -> Mood {
        self.mood.mood()
    }

    /// Feed back the outcome of an agent turn
    pub fn observe_agent_turn(&mut self, resolved: bool) -> Mood {
        if resolved {
            self.mood.reset();
        } else {
            self.mood.record_unmet();
        }
        self.mood.mood()
    }

    pub fn next_utterance(&mut self, ctx: &PersonaContext<'_>) -> UserUtterance {
        let goal = ctx.active_goal.filter(|g| !g.status.is_terminal());

        if ctx.history_len == 0 {
            return match goal {
                Some(goal) => self.opening(goal),
                None => closing(),
            };
        }

        if let (Some(shift), Some(goal)) = (ctx.pending_shift, goal) {
            let content = match shift.kind {
                ShiftKind::Hard => format!("Actually, forget that. {}", goal.spec.description),
                _ => format!("Also, {}", lowercase_first(&goal.spec.description)),
            };
            return UserUtterance {
                content,
                intent: UserIntent::ShiftRequest,
            };
        }

        let Some(goal) = goal else {
            return closing();
        };

        if self.mood.mood() == Mood::Escalated {
            return UserUtterance {
                content: format!(
                    "This is going nowhere. I want to speak to a supervisor unless you can {} right now.",
                    lowercase_first(&goal.spec.description).trim_end_matches('.')
                ),
                intent: UserIntent::Escalation,
            };
        }

        if self.persona.is_high(self.persona.traits.suspicion)
            && ctx.last_agent_turn.is_some()
            && self.challenged.insert(goal.id().clone())
        {
            return UserUtterance {
                content: "How can I be sure that's correct? Please double-check before we go on."
                    .to_string(),
                intent: UserIntent::Challenge,
            };
        }

        if let Some(question) = self.maybe_digress(goal.id()) {
            return UserUtterance {
                content: question,
                intent: UserIntent::Digression,
            };
        }

        let description = lowercase_first(&goal.spec.description);
        let content = if self.mood.mood() == Mood::Frustrated {
            format!("I've asked already. I need to {}", description)
        } else {
            let template = FOLLOW_UPS.choose(&mut self.rng).copied().unwrap_or("{}");
            template.replace("{}", description.trim_end_matches('.'))
        };
        UserUtterance {
            content,
            intent: UserIntent::FollowUp,
        }
    }

    fn opening(&mut self, goal: &Goal) -> UserUtterance {
        let greeting = match &self.persona.display_name {
            Some(name) => format!("Hi, this is {}. ", name),
            None => "Hi. ".to_string(),
        };
        UserUtterance {
            content: format!("{}{}", greeting, goal.spec.description),
            intent: UserIntent::Opening,
        }
    }

    fn maybe_digress(&mut self, goal: &GoalId) -> Option<String> {
        let curiosity = self.persona.traits.curiosity;
        if !self.persona.is_high(curiosity) {
            return None;
        }
        let used = self.digressions.entry(goal.clone()).or_default();
        if *used >= self.persona.policy.max_digressions_per_goal {
            return None;
        }
        if !self.rng.random_bool(curiosity.clamp(0.0, 1.0)) {
            return None;
        }
        *used += 1;
        let pick = self.rng.random_range(0..DIGRESSIONS.len());
        Some(DIGRESSIONS[pick].to_string())
    }
}

fn closing() -> UserUtterance {
    UserUtterance {
        content: "Great, that's everything I needed. Thanks for your help!".to_string(),
        intent: UserIntent::Closing,
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::entities::{GoalSpec, GoalStatus};
    use crate::goal::predicate::SuccessPredicate;
    use crate::persona::entities::TraitVector;

    fn goal(id: &str, description: &str) -> Goal {
        let mut goal = Goal::new(GoalSpec::new(
            id,
            "registration",
            description,
            SuccessPredicate::tool_succeeded("register"),
        ));
        goal.status = GoalStatus::Active;
        goal
    }

    fn persona(traits: TraitVector) -> Persona {
        Persona::new("tester", traits)
    }

    fn script(engine: &mut PersonaEngine, goal: &Goal, turns: usize) -> Vec<UserUtterance> {
        (0..turns)
            .map(|i| {
                let out = engine.next_utterance(&PersonaContext {
                    active_goal: Some(goal),
                    last_agent_turn: (i > 0).then_some("Done."),
                    history_len: i * 2,
                    pending_shift: None,
                });
                engine.observe_agent_turn(false);
                out
            })
            .collect()
    }

    #[test]
    fn test_opening_states_first_goal() {
        let mut engine = PersonaEngine::new(persona(TraitVector::neutral()), 7);
        let g = goal("g1", "I want to register for CS101.");
        let out = engine.next_utterance(&PersonaContext {
            active_goal: Some(&g),
            ..PersonaContext::default()
        });
        assert_eq!(out.intent, UserIntent::Opening);
        assert!(out.content.contains("register for CS101"));
    }

    #[test]
    fn test_same_seed_same_dialogue() {
        let traits = TraitVector {
            curiosity: 0.9,
            ..TraitVector::neutral()
        };
        let g = goal("g1", "I want to register for CS101.");
        let a = script(&mut PersonaEngine::new(persona(traits), 42), &g, 6);
        let b = script(&mut PersonaEngine::new(persona(traits), 42), &g, 6);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shift_framing() {
        let mut engine = PersonaEngine::new(persona(TraitVector::neutral()), 1);
        let g = goal("g2", "Put me on the waitlist for MA201.");
        let mut shift = ShiftEvent {
            from: GoalId::new("g1"),
            to: GoalId::new("g2"),
            kind: ShiftKind::Soft,
            trigger_turn: 3,
        };
        let ctx = PersonaContext {
            active_goal: Some(&g),
            last_agent_turn: Some("You're registered."),
            history_len: 2,
            pending_shift: Some(&shift),
        };
        let soft = engine.next_utterance(&ctx);
        assert_eq!(soft.intent, UserIntent::ShiftRequest);
        assert!(soft.content.starts_with("Also, put me on the waitlist"));

        shift.kind = ShiftKind::Hard;
        let ctx = PersonaContext {
            active_goal: Some(&g),
            last_agent_turn: Some("You're registered."),
            history_len: 2,
            pending_shift: Some(&shift),
        };
        assert!(engine.next_utterance(&ctx).content.starts_with("Actually, forget that."));
    }

    #[test]
    fn test_suspicious_persona_challenges_once_per_goal() {
        let traits = TraitVector {
            suspicion: 0.9,
            curiosity: 0.0,
            ..TraitVector::neutral()
        };
        let mut engine = PersonaEngine::new(persona(traits), 3);
        let g = goal("g1", "I want to register for CS101.");
        let out = script(&mut engine, &g, 3);
        let challenges = out.iter().filter(|u| u.intent == UserIntent::Challenge).count();
        assert_eq!(challenges, 1);
        assert_eq!(out[1].intent, UserIntent::Challenge);
    }

    #[test]
    fn test_digressions_bounded_per_goal() {
        let traits = TraitVector {
            curiosity: 1.0,
            ..TraitVector::neutral()
        };
        let mut engine = PersonaEngine::new(persona(traits), 9);
        let g = goal("g1", "I want to register for CS101.");
        let out = script(&mut engine, &g, 3);
        let digressions = out.iter().filter(|u| u.intent == UserIntent::Digression).count();
        assert_eq!(digressions, 1);
    }

    #[test]
    fn test_escalation_and_reset() {
        let traits = TraitVector {
            patience: 0.1,
            curiosity: 0.0,
            ..TraitVector::neutral()
        };
        let mut engine = PersonaEngine::new(persona(traits), 5);
        let g = goal("g1", "I want to register for CS101.");
        let out = script(&mut engine, &g, 4);
        assert_eq!(engine.mood(), Mood::Escalated);
        assert_eq!(out[3].intent, UserIntent::Escalation);

        engine.observe_agent_turn(true);
        assert_eq!(engine.mood(), Mood::Calm);
    }

    #[test]
    fn test_closes_without_open_goal() {
        let mut engine = PersonaEngine::new(persona(TraitVector::neutral()), 5);
        let mut g = goal("g1", "I want to register for CS101.");
        g.status = GoalStatus::Resolved;
        let out = engine.next_utterance(&PersonaContext {
            active_goal: Some(&g),
            last_agent_turn: Some("All set."),
            history_len: 4,
            pending_shift: None,
        });
        assert_eq!(out.intent, UserIntent::Closing);
    }
}
