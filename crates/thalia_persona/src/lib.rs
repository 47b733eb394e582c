pub mod engine;
pub mod patterns;

pub use engine::{dominant_emotion, EmotionalStateEngine, PersonaSnapshot};
pub use patterns::{patterns_for, ResponsePattern};
