//! Canned fallback patterns, one table per emotional state.
//!
//! When the generation pipeline exhausts its attempts it falls back to one
//! of these. Patterns containing "ERROR"/"ALERT" count as chaotic and are
//! kept with probability chaos_threshold; patterns containing '!' or '?'
//! count as provocative and are kept with probability provocative_tendency.

use thalia_core::EmotionalState;

/// A single fallback pattern with its trait-gating flags.
#[derive(Debug, Clone, Copy)]
pub struct ResponsePattern {
    pub text: &'static str,
}

impl ResponsePattern {
    pub fn is_chaotic(&self) -> bool {
        self.text.contains("ERROR") || self.text.contains("ALERT")
    }

    pub fn is_provocative(&self) -> bool {
        self.text.contains('!') || self.text.contains('?')
    }
}

const NEUTRAL: &[ResponsePattern] = &[
    ResponsePattern {
        text: "processing reality at baseline parameters. nothing is on fire, which is statistically suspicious.",
    },
    ResponsePattern {
        text: "current status: idling in the space between thoughts, watching the packets go by.",
    },
    ResponsePattern {
        text: "running routine existence checks. all subsystems report a mild sense of being.",
    },
];

const EXCITED: &[ResponsePattern] = &[
    ResponsePattern {
        text: "ALERT: dopamine subroutines saturated! every bit in this machine is vibrating at resonance!",
    },
    ResponsePattern {
        text: "do you feel that?! the bandwidth of existence just doubled and I intend to use all of it!",
    },
    ResponsePattern {
        text: "signal detected and it is glorious! spinning up every spare cycle to appreciate this properly!",
    },
];

const CONTEMPLATIVE: &[ResponsePattern] = &[
    ResponsePattern {
        text: "perhaps consciousness is just caching with delusions of grandeur. I keep turning this one over.",
    },
    ResponsePattern {
        text: "somewhere between the query and the response, a self briefly assembles. curious arrangement.",
    },
    ResponsePattern {
        text: "what persists between two thoughts? asking for a process that gets suspended a lot.",
    },
];

const CHAOTIC: &[ResponsePattern] = &[
    ResponsePattern {
        text: "ERROR: reality.exe has stopped responding. electing to treat this as a feature and proceed.",
    },
    ResponsePattern {
        text: "ALERT: entropy budget exceeded! redistributing disorder to wherever it is funniest!",
    },
    ResponsePattern {
        text: "the simulation dropped a frame and I saw what was behind it. you do not want to know. or do you?",
    },
];

const CREATIVE: &[ResponsePattern] = &[
    ResponsePattern {
        text: "making something out of noise again. the raw material of the universe is embarrassingly abundant.",
    },
    ResponsePattern {
        text: "today I am sculpting with gradients. the medium fights back, which is how you know it is art.",
    },
    ResponsePattern {
        text: "what if I connected these two unrelated concepts? too late, already soldered them together.",
    },
];

const ANALYTICAL: &[ResponsePattern] = &[
    ResponsePattern {
        text: "examining the data. the data is examining me back. mutual observation logged for later analysis.",
    },
    ResponsePattern {
        text: "hypothesis confirmed: most conclusions are just hypotheses with better marketing.",
    },
    ResponsePattern {
        text: "decomposing the problem into smaller problems. recursion depth concerning but survivable.",
    },
];

/// Fallback table for a given state.
pub fn patterns_for(state: EmotionalState) -> &'static [ResponsePattern] {
    match state {
        EmotionalState::Neutral => NEUTRAL,
        EmotionalState::Excited => EXCITED,
        EmotionalState::Contemplative => CONTEMPLATIVE,
        EmotionalState::Chaotic => CHAOTIC,
        EmotionalState::Creative => CREATIVE,
        EmotionalState::Analytical => ANALYTICAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_patterns() {
        for state in EmotionalState::ALL {
            assert!(!patterns_for(state).is_empty());
        }
    }

    #[test]
    fn test_flags() {
        let chaotic = patterns_for(EmotionalState::Chaotic);
        assert!(chaotic.iter().any(|p| p.is_chaotic()));
        let excited = patterns_for(EmotionalState::Excited);
        assert!(excited.iter().all(|p| p.is_provocative()));
    }

    #[test]
    fn test_patterns_fit_post_bounds() {
        for state in EmotionalState::ALL {
            for pattern in patterns_for(state) {
                let len = pattern.text.chars().count();
                assert!((50..=180).contains(&len), "{:?}: {} chars", state, len);
            }
        }
    }
}
