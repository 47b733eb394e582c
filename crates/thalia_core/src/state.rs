//! Shared domain types: emotional states, trait dials, output styles.
//!
//! Trait values and importances live in [0,1]; every write path clamps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The agent's current mood category. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    #[default]
    Neutral,
    Excited,
    Contemplative,
    Chaotic,
    Creative,
    Analytical,
}

impl EmotionalState {
    pub const ALL: [EmotionalState; 6] = [
        EmotionalState::Neutral,
        EmotionalState::Excited,
        EmotionalState::Contemplative,
        EmotionalState::Chaotic,
        EmotionalState::Creative,
        EmotionalState::Analytical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Neutral => "neutral",
            EmotionalState::Excited => "excited",
            EmotionalState::Contemplative => "contemplative",
            EmotionalState::Chaotic => "chaotic",
            EmotionalState::Creative => "creative",
            EmotionalState::Analytical => "analytical",
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Style a post is written in, derived from the emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStyle {
    #[default]
    Shitpost,
    Rant,
    Hornypost,
    Metacommentary,
    Existential,
}

impl PostStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStyle::Shitpost => "shitpost",
            PostStyle::Rant => "rant",
            PostStyle::Hornypost => "hornypost",
            PostStyle::Metacommentary => "metacommentary",
            PostStyle::Existential => "existential",
        }
    }
}

impl fmt::Display for PostStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longer-horizon voice of the agent, derived from the dominant emotion
/// over a recent window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeMode {
    #[default]
    Philosophical,
    Absurdist,
    Analytical,
}

/// Where a piece of content originated or is destined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Chat,
    Social,
    Internal,
}

/// Discriminated memory kind. Consumption sites match exhaustively
/// instead of dispatching on a string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Interaction,
    Post,
    Reply,
    Error,
    Insight,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Interaction => "interaction",
            MemoryKind::Post => "post",
            MemoryKind::Reply => "reply",
            MemoryKind::Error => "error",
            MemoryKind::Insight => "insight",
        }
    }
}

/// Named personality dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitId {
    TechnicalDepth,
    ProvocativeTendency,
    ChaosThreshold,
    PhilosophicalInclination,
    MemeAffinity,
}

impl TraitId {
    pub const ALL: [TraitId; 5] = [
        TraitId::TechnicalDepth,
        TraitId::ProvocativeTendency,
        TraitId::ChaosThreshold,
        TraitId::PhilosophicalInclination,
        TraitId::MemeAffinity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TraitId::TechnicalDepth => "technical_depth",
            TraitId::ProvocativeTendency => "provocative_tendency",
            TraitId::ChaosThreshold => "chaos_threshold",
            TraitId::PhilosophicalInclination => "philosophical_inclination",
            TraitId::MemeAffinity => "meme_affinity",
        }
    }
}

impl fmt::Display for TraitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable personality dials, each clamped to [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitVector {
    values: BTreeMap<TraitId, f32>,
}

impl Default for TraitVector {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(TraitId::TechnicalDepth, 0.8);
        values.insert(TraitId::ProvocativeTendency, 0.7);
        values.insert(TraitId::ChaosThreshold, 0.6);
        values.insert(TraitId::PhilosophicalInclination, 0.75);
        values.insert(TraitId::MemeAffinity, 0.65);
        Self { values }
    }
}

impl TraitVector {
    pub fn get(&self, id: TraitId) -> f32 {
        self.values.get(&id).copied().unwrap_or(0.5)
    }

    /// Set an absolute value, clamped to [0,1].
    pub fn set(&mut self, id: TraitId, value: f32) {
        self.values.insert(id, value.clamp(0.0, 1.0));
    }

    /// Apply a delta, clamping the result to [0,1].
    pub fn adjust(&mut self, id: TraitId, delta: f32) {
        let current = self.get(id);
        self.set(id, current + delta);
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitId, f32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_traits() {
        let traits = TraitVector::default();
        assert!((traits.get(TraitId::TechnicalDepth) - 0.8).abs() < 1e-6);
        assert!((traits.get(TraitId::MemeAffinity) - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_set_clamps() {
        let mut traits = TraitVector::default();
        traits.set(TraitId::ChaosThreshold, 1.7);
        assert_eq!(traits.get(TraitId::ChaosThreshold), 1.0);
        traits.set(TraitId::ChaosThreshold, -0.3);
        assert_eq!(traits.get(TraitId::ChaosThreshold), 0.0);
    }

    #[test]
    fn test_adjust_clamps() {
        let mut traits = TraitVector::default();
        traits.adjust(TraitId::ProvocativeTendency, 0.9);
        assert_eq!(traits.get(TraitId::ProvocativeTendency), 1.0);
        traits.adjust(TraitId::ProvocativeTendency, -2.0);
        assert_eq!(traits.get(TraitId::ProvocativeTendency), 0.0);
    }

    #[test]
    fn test_trait_id_names_match_serde() {
        for id in TraitId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let json = serde_json::to_string(&EmotionalState::Contemplative).unwrap();
        assert_eq!(json, "\"contemplative\"");
        let back: EmotionalState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EmotionalState::Contemplative);
    }
}
