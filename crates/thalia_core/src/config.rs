//! Configuration: TOML file with per-section defaults and env overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThaliaConfig {
    pub persona: PersonaConfig,
    pub memory: MemoryConfig,
    pub pipeline: PipelineConfig,
    pub scheduler: SchedulerConfig,
    pub engagement: EngagementConfig,
}

impl ThaliaConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields, then apply env var overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: ThaliaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("THALIA_VOLATILITY") {
            if let Ok(n) = v.parse::<f32>() {
                self.persona.emotional_volatility = n.clamp(0.0, 1.0);
            }
        }
        if let Ok(v) = std::env::var("THALIA_AUTO_MODE") {
            self.scheduler.auto_mode = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("THALIA_CYCLE_MINUTES") {
            if let Ok(n) = v.parse() {
                self.engagement.cycle_minutes = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Probability of actually moving to a newly classified emotional state.
    /// Low values resist emotional flapping.
    pub emotional_volatility: f32,
    /// Window of recent output lengths inspected by the coherence pass.
    pub coherence_window: usize,
    /// Window of recent emotional states used for the narrative mode.
    pub emotion_window: usize,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            emotional_volatility: 0.3,
            coherence_window: 10,
            emotion_window: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub short_term_capacity: usize,
    pub long_term_capacity: usize,
    pub retention_days: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_capacity: 100,
            long_term_capacity: 1000,
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Attempt cap for one generate() call (validation retries).
    pub max_attempts: u32,
    /// Inclusive character bounds for social posts.
    pub post_min_chars: usize,
    pub post_max_chars: usize,
    /// Character cap for conversational replies.
    pub reply_max_chars: usize,
    /// How many short-term memories go into the prompt.
    pub context_memories: usize,
    /// How many style examples to request (best-effort).
    pub style_examples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            post_min_chars: 50,
            post_max_chars: 180,
            reply_max_chars: 280,
            context_memories: 3,
            style_examples: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub auto_mode: bool,
    /// Uniform delay window for queued posts, in minutes.
    pub min_delay_minutes: u64,
    pub max_delay_minutes: u64,
    /// Flat gap enforced in manual single-post mode, in minutes.
    pub manual_gap_minutes: u64,
    /// Hard floor between any two actual posts, in minutes.
    pub post_floor_minutes: u64,
    /// Fixed wait after a failed post before re-arming, in minutes.
    pub failure_wait_minutes: u64,
    /// Quiet hours: [start, end) wraps midnight; posts shift to `resume_hour`.
    pub quiet_start_hour: u32,
    pub quiet_end_hour: u32,
    pub resume_hour: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_mode: false,
            min_delay_minutes: 15,
            max_delay_minutes: 30,
            manual_gap_minutes: 30,
            post_floor_minutes: 2,
            failure_wait_minutes: 5,
            quiet_start_hour: 23,
            quiet_end_hour: 6,
            resume_hour: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub max_replies_per_hour: usize,
    pub max_daily_replies_per_target: usize,
    /// Minimum spacing between replies to the same target, in minutes.
    pub min_reply_gap_minutes: i64,
    /// Monitoring cycle period, in minutes.
    pub cycle_minutes: u64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            max_replies_per_hour: 30,
            max_daily_replies_per_target: 10,
            min_reply_gap_minutes: 2,
            cycle_minutes: 15,
        }
    }
}
