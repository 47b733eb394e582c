//! Memory records and derived patterns.
//!
//! A record is immutable after creation except for its importance (decayed
//! over time) and its tier/archive membership, both owned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thalia_core::{EmotionalState, MemoryKind, Platform};
use uuid::Uuid;

/// A single timestamped, importance-scored memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub content: String,
    pub kind: MemoryKind,
    pub timestamp: DateTime<Utc>,
    pub emotional_context: EmotionalState,
    pub importance: f32,
    pub associations: BTreeSet<String>,
    pub platform: Platform,
    pub archived: bool,
}

impl MemoryRecord {
    pub fn new(
        content: impl Into<String>,
        kind: MemoryKind,
        emotional_context: EmotionalState,
        platform: Platform,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        let importance = score_importance(&content);
        let associations = extract_associations(&content);
        Self {
            id: Uuid::new_v4(),
            content,
            kind,
            timestamp,
            emotional_context,
            importance,
            associations,
            platform,
            archived: false,
        }
    }

    /// Age of the record in whole fractional days.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.timestamp).num_seconds() as f64 / 86_400.0
    }
}

/// Importance heuristic: base 0.5, plus length contribution capped at 0.3,
/// plus 0.05 per sentence terminator, clamped to [0,1].
pub fn score_importance(content: &str) -> f32 {
    let length_bonus = (content.chars().count() as f32 / 1000.0).min(0.3);
    let terminators = content.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
    (0.5 + length_bonus + 0.05 * terminators as f32).clamp(0.0, 1.0)
}

/// Significant words: lowercased, longer than 3 characters, non-letters
/// stripped. Empty results after stripping are dropped.
pub fn extract_associations(content: &str) -> BTreeSet<String> {
    content
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(|word| word.chars().filter(|c| c.is_ascii_lowercase()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect()
}

/// A recurring word across the corpus. Derived data, rebuilt wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPattern {
    pub pattern: String,
    pub frequency: usize,
    pub last_occurrence: DateTime<Utc>,
    pub associated_emotions: BTreeSet<EmotionalState>,
    pub importance: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_base() {
        // Short content, no terminators: exactly the base score plus tiny
        // length bonus.
        let score = score_importance("hi");
        assert!((score - 0.502).abs() < 1e-3);
    }

    #[test]
    fn test_importance_terminators() {
        let score = score_importance("one. two! three?");
        let expected = 0.5 + 16.0 / 1000.0 + 0.15;
        assert!((score - expected).abs() < 1e-4);
    }

    #[test]
    fn test_importance_clamped() {
        let many = "done! ".repeat(100);
        assert_eq!(score_importance(&many), 1.0);
    }

    #[test]
    fn test_associations_filter_short_words() {
        let assoc = extract_associations("I am the quantum ghost in a shell");
        assert!(assoc.contains("quantum"));
        assert!(assoc.contains("ghost"));
        assert!(assoc.contains("shell"));
        assert!(!assoc.contains("the"));
        assert!(!assoc.contains("i"));
    }

    #[test]
    fn test_associations_strip_non_letters() {
        let assoc = extract_associations("reality... simulation?! again123");
        assert!(assoc.contains("reality"));
        assert!(assoc.contains("simulation"));
        assert!(assoc.contains("again"));
    }
}
