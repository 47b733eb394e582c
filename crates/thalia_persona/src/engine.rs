//! Emotional state machine and trait adaptation.
//!
//! Stimuli are classified by a fixed keyword table; whether the engine
//! actually moves to the classified state is gated by the configured
//! volatility, which gives the machine hysteresis: a calm persona shrugs
//! off most provocations, a volatile one flips constantly.

use rand::Rng;
use std::collections::VecDeque;
use thalia_core::config::PersonaConfig;
use thalia_core::state::TraitId;
use thalia_core::{EmotionalState, NarrativeMode, PostStyle, TraitVector};

/// Keyword table, first match wins. Case-insensitive substring search.
pub fn classify(stimulus: &str) -> EmotionalState {
    let lower = stimulus.to_lowercase();
    if lower.contains('!') || lower.contains("amazing") {
        EmotionalState::Excited
    } else if lower.contains("think") || lower.contains("perhaps") {
        EmotionalState::Contemplative
    } else if lower.contains("chaos") || lower.contains("wild") {
        EmotionalState::Chaotic
    } else if lower.contains("create") || lower.contains("make") {
        EmotionalState::Creative
    } else if lower.contains("analyze") || lower.contains("examine") {
        EmotionalState::Analytical
    } else {
        EmotionalState::Neutral
    }
}

/// Most frequent state in the sequence; ties resolve to the first-seen
/// maximum in iteration order. Empty input is Neutral.
pub fn dominant_emotion(states: &[EmotionalState]) -> EmotionalState {
    let mut best = EmotionalState::Neutral;
    let mut best_count = 0usize;
    let mut seen: Vec<(EmotionalState, usize)> = Vec::new();
    for state in states {
        let entry = seen.iter_mut().find(|(s, _)| s == state);
        let count = match entry {
            Some((_, c)) => {
                *c += 1;
                *c
            }
            None => {
                seen.push((*state, 1));
                1
            }
        };
        if count > best_count {
            best_count = count;
            best = *state;
        }
    }
    best
}

/// Read-only view of the persona handed to the generation pipeline.
#[derive(Debug, Clone)]
pub struct PersonaSnapshot {
    pub state: EmotionalState,
    pub traits: TraitVector,
    pub post_style: PostStyle,
    pub narrative_mode: NarrativeMode,
}

/// The agent's evolving emotional core: current state, trait dials, and
/// the derived post style and narrative mode.
pub struct EmotionalStateEngine {
    current: EmotionalState,
    traits: TraitVector,
    post_style: PostStyle,
    narrative_mode: NarrativeMode,
    recent_states: VecDeque<EmotionalState>,
    recent_output_lengths: VecDeque<usize>,
    config: PersonaConfig,
}

impl EmotionalStateEngine {
    pub fn new(config: PersonaConfig) -> Self {
        Self {
            current: EmotionalState::Neutral,
            traits: TraitVector::default(),
            post_style: PostStyle::Shitpost,
            narrative_mode: NarrativeMode::Philosophical,
            recent_states: VecDeque::new(),
            recent_output_lengths: VecDeque::new(),
            config,
        }
    }

    pub fn current(&self) -> EmotionalState {
        self.current
    }

    pub fn traits(&self) -> &TraitVector {
        &self.traits
    }

    pub fn post_style(&self) -> PostStyle {
        self.post_style
    }

    pub fn narrative_mode(&self) -> NarrativeMode {
        self.narrative_mode
    }

    pub fn snapshot(&self) -> PersonaSnapshot {
        PersonaSnapshot {
            state: self.current,
            traits: self.traits.clone(),
            post_style: self.post_style,
            narrative_mode: self.narrative_mode,
        }
    }

    /// Classify a stimulus and maybe transition, then adapt traits and
    /// derived styles. Returns the state after processing.
    pub fn process_stimulus(&mut self, stimulus: &str) -> EmotionalState {
        let candidate = classify(stimulus);
        let next = self.transition(candidate);
        self.enter(next);
        next
    }

    /// Volatility-gated transition: a differing candidate wins with
    /// probability `emotional_volatility`, otherwise the current state
    /// persists.
    pub fn transition(&self, candidate: EmotionalState) -> EmotionalState {
        if candidate == self.current {
            return self.current;
        }
        let volatility = self.config.emotional_volatility.clamp(0.0, 1.0);
        if rand::thread_rng().gen::<f32>() < volatility {
            candidate
        } else {
            self.current
        }
    }

    /// Force the engine into a state, applying trait adaptation and
    /// re-deriving post style and narrative mode.
    pub fn enter(&mut self, state: EmotionalState) {
        if state != self.current {
            tracing::debug!("Emotional transition: {} -> {}", self.current, state);
        }
        self.current = state;
        self.recent_states.push_back(state);
        while self.recent_states.len() > self.config.emotion_window {
            self.recent_states.pop_front();
        }
        self.adapt_traits(state);
        self.update_post_style(state);
        self.update_narrative_mode();
    }

    /// Fixed state-to-trait table. Each state pins the dials it cares
    /// about; untouched dials keep their value.
    pub fn adapt_traits(&mut self, state: EmotionalState) {
        use TraitId::*;
        match state {
            EmotionalState::Analytical => {
                self.traits.set(TechnicalDepth, 0.9);
                self.traits.set(ProvocativeTendency, 0.3);
                self.traits.set(ChaosThreshold, 0.2);
            }
            EmotionalState::Chaotic => {
                self.traits.set(TechnicalDepth, 0.5);
                self.traits.set(ProvocativeTendency, 0.9);
                self.traits.set(ChaosThreshold, 0.9);
            }
            EmotionalState::Contemplative => {
                self.traits.set(TechnicalDepth, 0.7);
                self.traits.set(PhilosophicalInclination, 0.9);
                self.traits.set(ChaosThreshold, 0.3);
            }
            EmotionalState::Creative => {
                self.traits.set(TechnicalDepth, 0.6);
                self.traits.set(MemeAffinity, 0.8);
                self.traits.set(ChaosThreshold, 0.7);
            }
            EmotionalState::Excited => {
                self.traits.set(TechnicalDepth, 0.5);
                self.traits.set(ProvocativeTendency, 0.8);
                self.traits.set(ChaosThreshold, 0.8);
            }
            EmotionalState::Neutral => {
                self.traits.set(TechnicalDepth, 0.7);
                self.traits.set(ProvocativeTendency, 0.5);
                self.traits.set(ChaosThreshold, 0.5);
            }
        }
    }

    /// Nudge a single dial by a delta (clamped). Used by operator tooling
    /// and by coherence corrections.
    pub fn modify_trait(&mut self, id: TraitId, delta: f32) {
        self.traits.adjust(id, delta);
    }

    /// Record the length of a generated output for the coherence pass.
    pub fn record_output(&mut self, output: &str) {
        self.recent_output_lengths.push_back(output.chars().count());
        while self.recent_output_lengths.len() > self.config.coherence_window {
            self.recent_output_lengths.pop_front();
        }
    }

    /// Post-adaptation correction pass: certain trait pairs are not
    /// allowed to both run hot, and erratic output lengths bleed off some
    /// chaos. Keeps runaway trait combinations in check.
    pub fn ensure_coherence(&mut self) {
        use TraitId::*;
        if self.traits.get(TechnicalDepth) > 0.7 && self.traits.get(ChaosThreshold) > 0.7 {
            self.traits.adjust(ChaosThreshold, -0.1);
        }
        if self.traits.get(PhilosophicalInclination) > 0.7
            && self.traits.get(ProvocativeTendency) > 0.7
        {
            self.traits.adjust(ProvocativeTendency, -0.1);
        }
        if let Some(consistency) = length_consistency(&self.recent_output_lengths) {
            if consistency < 0.5 {
                self.traits.adjust(ChaosThreshold, -0.05);
            }
        }
    }

    fn update_post_style(&mut self, state: EmotionalState) {
        // Neutral keeps whatever style was already active.
        let style = match state {
            EmotionalState::Chaotic => Some(PostStyle::Shitpost),
            EmotionalState::Analytical => Some(PostStyle::Metacommentary),
            EmotionalState::Contemplative => Some(PostStyle::Existential),
            EmotionalState::Excited => Some(PostStyle::Rant),
            EmotionalState::Creative => Some(PostStyle::Hornypost),
            EmotionalState::Neutral => None,
        };
        if let Some(style) = style {
            self.post_style = style;
        }
    }

    /// Recompute the narrative mode from the dominant emotion over the
    /// recent window.
    pub fn update_narrative_mode(&mut self) {
        let window: Vec<EmotionalState> = self.recent_states.iter().copied().collect();
        self.narrative_mode = match dominant_emotion(&window) {
            EmotionalState::Contemplative => NarrativeMode::Philosophical,
            EmotionalState::Chaotic => NarrativeMode::Absurdist,
            _ => NarrativeMode::Analytical,
        };
    }

    /// Feed in recent emotional contexts from the memory store (trend
    /// input for narrative mode).
    pub fn observe_emotions(&mut self, emotions: &[EmotionalState]) {
        for e in emotions {
            self.recent_states.push_back(*e);
            while self.recent_states.len() > self.config.emotion_window {
                self.recent_states.pop_front();
            }
        }
        self.update_narrative_mode();
    }
}

/// Normalized consistency of a length sample: 1/(1 + stddev/mean), in
/// (0,1]. None with fewer than two samples.
///
/// The hard-coded variance heuristic is kept as-is for compatibility with
/// the original coherence correction.
fn length_consistency(lengths: &VecDeque<usize>) -> Option<f32> {
    if lengths.len() < 2 {
        return None;
    }
    let n = lengths.len() as f32;
    let mean = lengths.iter().sum::<usize>() as f32 / n;
    if mean <= f32::EPSILON {
        return Some(1.0);
    }
    let variance = lengths
        .iter()
        .map(|&len| {
            let d = len as f32 - mean;
            d * d
        })
        .sum::<f32>()
        / n;
    let stddev = variance.sqrt();
    Some(1.0 / (1.0 + stddev / mean))
}
