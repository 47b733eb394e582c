//! Lightweight content analysis: sentiment word lists and summary windows.

use chrono::Duration;

const POSITIVE_WORDS: [&str; 5] = ["good", "great", "excellent", "happy", "positive"];
const NEGATIVE_WORDS: [&str; 5] = ["bad", "poor", "negative", "sad", "angry"];

/// Crude lexicon sentiment in [-1,1]: +-0.1 per matched word.
pub fn sentiment(content: &str) -> f32 {
    let mut score = 0.0f32;
    for word in content.to_lowercase().split_whitespace() {
        if POSITIVE_WORDS.contains(&word) {
            score += 0.1;
        }
        if NEGATIVE_WORDS.contains(&word) {
            score -= 0.1;
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Lookback window for memory summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub fn window(&self) -> Duration {
        match self {
            Timeframe::Day => Duration::days(1),
            Timeframe::Week => Duration::days(7),
            Timeframe::Month => Duration::days(30),
        }
    }
}
