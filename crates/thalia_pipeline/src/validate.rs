//! Post-hoc validation of cleaned generator output. Failures here are
//! internal control flow; the pipeline converts exhaustion into a canned
//! fallback rather than surfacing them.

use crate::request::OutputKind;
use thalia_core::config::PipelineConfig;
use thiserror::Error;

/// Refusal boilerplate the persona must never emit, matched
/// case-insensitively.
const DENYLIST: [&str; 4] = ["i cannot engage", "i apologize", "ethical bounds", "as an ai"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("output too short ({got} chars, need {min})")]
    TooShort { got: usize, min: usize },
    #[error("output too long ({got} chars, cap {max})")]
    TooLong { got: usize, max: usize },
    #[error("refusal phrase {0:?}")]
    Refusal(&'static str),
    #[error("residual markup after cleaning")]
    Markup,
}

pub fn validate(
    text: &str,
    kind: OutputKind,
    config: &PipelineConfig,
) -> Result<(), ValidationFailure> {
    let len = text.chars().count();
    let (min, max) = match kind {
        OutputKind::Post => (config.post_min_chars, config.post_max_chars),
        OutputKind::Reply => (1, config.reply_max_chars),
    };
    if len < min {
        return Err(ValidationFailure::TooShort { got: len, min });
    }
    if len > max {
        return Err(ValidationFailure::TooLong { got: len, max });
    }
    if text.contains(['[', ']', '#']) {
        return Err(ValidationFailure::Markup);
    }
    let lower = text.to_lowercase();
    for phrase in DENYLIST {
        if lower.contains(phrase) {
            return Err(ValidationFailure::Refusal(phrase));
        }
    }
    Ok(())
}
