//! Persona domain module
//!
//! The simulated user. A [`Persona`] from the pack carries a trait vector
//! and dialogue policy; the [`PersonaEngine`] turns it into utterances.
//!
//! | Trait | High (≥ high threshold) | Low (< low threshold) |
//! |-------|-------------------------|-----------------------|
//! | patience | - | mood thresholds halved |
//! | suspicion | one challenge per goal | - |
//! | curiosity | digressions (p = curiosity) | - |
//! | confrontation | escalation one turn sooner | - |

pub mod engine;
pub mod entities;
pub mod mood;

pub use engine::{PersonaContext, PersonaEngine, UserIntent, UserUtterance};
pub use entities::{DialoguePolicy, Persona, TraitVector};
pub use mood::{Mood, MoodTracker};
