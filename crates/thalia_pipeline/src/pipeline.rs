//! The generation pipeline proper: bounded attempts against the text
//! generator, cleaning and validation between each, canned fallback at the
//! end. `generate` always returns text.

use crate::request::{build_prompt, GenerationInput, OutputKind};
use crate::sanitize::{sanitize, truncate_at_sentence};
use crate::validate::validate;
use rand::Rng;
use std::sync::Arc;
use thalia_core::config::PipelineConfig;
use thalia_core::state::TraitId;
use thalia_core::{EmotionalState, MemoryKind, RetryPolicy, StyleSource, TextGenerator};
use thalia_memory::MemoryStore;
use thalia_persona::{patterns_for, EmotionalStateEngine, PersonaSnapshot};
use tokio::sync::Mutex;

pub struct ResponseGenerationPipeline {
    generator: Arc<dyn TextGenerator>,
    style: Arc<dyn StyleSource>,
    memory: Arc<MemoryStore>,
    persona: Arc<Mutex<EmotionalStateEngine>>,
    config: PipelineConfig,
}

impl ResponseGenerationPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        style: Arc<dyn StyleSource>,
        memory: Arc<MemoryStore>,
        persona: Arc<Mutex<EmotionalStateEngine>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            style,
            memory,
            persona,
            config,
        }
    }

    /// Current persona view, for callers that label queued work with the
    /// active style.
    pub async fn persona_snapshot(&self) -> PersonaSnapshot {
        self.persona.lock().await.snapshot()
    }

    /// Generate a response for the input. Infallible: validation failures
    /// and generator outages degrade to a canned pattern, never an error.
    pub async fn generate(&self, input: &GenerationInput) -> String {
        let trend = self.memory.recent_emotions(self.config.context_memories).await;
        let snapshot = {
            let mut persona = self.persona.lock().await;
            persona.process_stimulus(&input.stimulus);
            persona.observe_emotions(&trend);
            persona.snapshot()
        };

        let recent = self
            .memory
            .query(None, None, None, self.config.context_memories)
            .await;
        let related = self
            .memory
            .associated(&input.stimulus, self.config.context_memories)
            .await;
        let examples = match self
            .style
            .examples(self.config.style_examples, snapshot.post_style.as_str())
            .await
        {
            Ok(examples) => examples,
            Err(err) => {
                tracing::debug!("style source unavailable: {err:#}");
                Vec::new()
            }
        };
        let prompt = build_prompt(input, &snapshot, &recent, &related, &examples, &self.config);

        let policy = RetryPolicy::generator(self.config.max_attempts);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.generator.generate(&prompt).await {
                Ok(raw) => {
                    let candidate = self.clean(&raw, input.kind);
                    match validate(&candidate, input.kind, &self.config) {
                        Ok(()) => return self.finish(input, snapshot.state, candidate).await,
                        Err(err) => {
                            tracing::warn!(attempt, "rejected generated output: {err}");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(attempt, "text generator failed: {err:#}");
                    if let Some(delay) = policy.decide(attempt) {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    break;
                }
            }
            if policy.decide(attempt).is_none() {
                break;
            }
        }

        tracing::info!(state = %snapshot.state, "all attempts exhausted, using fallback pattern");
        let fallback = self.fallback(&snapshot);
        self.finish(input, snapshot.state, fallback).await
    }

    fn clean(&self, raw: &str, kind: OutputKind) -> String {
        let cleaned = sanitize(raw);
        match kind {
            OutputKind::Post => truncate_at_sentence(&cleaned, self.config.post_max_chars),
            OutputKind::Reply => truncate_at_sentence(&cleaned, self.config.reply_max_chars),
        }
    }

    /// Canned fallback, filtered by the trait dials: chaotic patterns
    /// survive with probability chaos_threshold, provocative ones with
    /// probability provocative_tendency. An empty survivor set falls back
    /// to a uniform pick over the whole table.
    fn fallback(&self, snapshot: &PersonaSnapshot) -> String {
        let table = patterns_for(snapshot.state);
        let chaos = snapshot.traits.get(TraitId::ChaosThreshold);
        let provocative = snapshot.traits.get(TraitId::ProvocativeTendency);
        let mut rng = rand::thread_rng();
        let survivors: Vec<&str> = table
            .iter()
            .filter(|p| {
                (!p.is_chaotic() || rng.gen::<f32>() < chaos)
                    && (!p.is_provocative() || rng.gen::<f32>() < provocative)
            })
            .map(|p| p.text)
            .collect();
        if survivors.is_empty() {
            table[rng.gen_range(0..table.len())].text.to_string()
        } else {
            survivors[rng.gen_range(0..survivors.len())].to_string()
        }
    }

    /// Success path shared by generated and fallback output: append the
    /// state marker for non-posts, store the response as a memory, and run
    /// the persona's coherence pass.
    async fn finish(&self, input: &GenerationInput, state: EmotionalState, text: String) -> String {
        let response = match input.kind {
            OutputKind::Post => text,
            OutputKind::Reply => format!("{} [{}_state]", text, state.as_str()),
        };
        let kind = match input.kind {
            OutputKind::Post => MemoryKind::Post,
            OutputKind::Reply => MemoryKind::Interaction,
        };
        self.memory
            .add_memory(&response, kind, state, input.platform)
            .await;
        {
            let mut persona = self.persona.lock().await;
            persona.record_output(&response);
            persona.ensure_coherence();
            persona.update_narrative_mode();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use thalia_core::config::PersonaConfig;

    /// Scripted generator: pops one canned result per call, errors when
    /// the script runs dry.
    struct ScriptedGenerator {
        script: StdMutex<VecDeque<anyhow::Result<String>>>,
        calls: StdMutex<u32>,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<anyhow::Result<String>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                calls: StdMutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    struct NoStyle;

    #[async_trait]
    impl StyleSource for NoStyle {
        async fn examples(&self, _count: usize, _group: &str) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn pipeline(script: Vec<anyhow::Result<String>>) -> (ResponseGenerationPipeline, Arc<ScriptedGenerator>, Arc<MemoryStore>) {
        let generator = Arc::new(ScriptedGenerator::new(script));
        let memory = Arc::new(MemoryStore::in_memory());
        // Zero volatility keeps the engine pinned to Neutral for determinism.
        let persona = Arc::new(Mutex::new(EmotionalStateEngine::new(PersonaConfig {
            emotional_volatility: 0.0,
            ..PersonaConfig::default()
        })));
        let p = ResponseGenerationPipeline::new(
            generator.clone(),
            Arc::new(NoStyle),
            memory.clone(),
            persona,
            PipelineConfig::default(),
        );
        (p, generator, memory)
    }

    fn valid_post() -> String {
        "a perfectly serviceable observation about the nature of distributed systems today".to_string()
    }

    #[tokio::test]
    async fn test_first_valid_output_wins() {
        let (pipeline, generator, memory) =
            pipeline(vec![Ok("too short".to_string()), Ok(valid_post())]);
        let out = pipeline.generate(&GenerationInput::post("systems")).await;
        assert_eq!(out, valid_post());
        assert_eq!(generator.calls(), 2);
        // The response itself was stored as a memory.
        assert_eq!(memory.short_term_len().await, 1);
    }

    #[tokio::test]
    async fn test_post_has_no_marker_reply_has_one() {
        let (pipeline, _, _) = pipeline(vec![Ok(valid_post())]);
        let post = pipeline.generate(&GenerationInput::post("anything")).await;
        assert!(!post.contains('['));

        let (pipeline, _, _) = self::pipeline(vec![Ok("a reply of reasonable length".to_string())]);
        let reply = pipeline.generate(&GenerationInput::reply("hello")).await;
        assert!(reply.ends_with(" [neutral_state]"));
        assert_eq!(reply.matches('[').count(), 1);
    }

    #[tokio::test]
    async fn test_output_is_cleaned_before_validation() {
        let dirty = format!("#hot take: {} \u{1F525}", valid_post());
        let (pipeline, _, _) = pipeline(vec![Ok(dirty)]);
        let out = pipeline.generate(&GenerationInput::post("takes")).await;
        assert!(!out.contains('#'));
        assert!(!out.contains('\u{1F525}'));
    }

    #[tokio::test]
    async fn test_overlong_post_truncated_at_sentence() {
        let long = format!("{}. {}", valid_post(), "and then it keeps going ".repeat(10));
        let (pipeline, _, _) = pipeline(vec![Ok(long)]);
        let out = pipeline.generate(&GenerationInput::post("length")).await;
        assert!(out.chars().count() <= 180);
        assert!(out.ends_with('.'));
    }

    #[tokio::test]
    async fn test_fallback_after_three_rejections() {
        let (pipeline, generator, _) = pipeline(vec![
            Ok("nope".to_string()),
            Ok("still nope".to_string()),
            Ok("I apologize, but as an AI I cannot engage with that topic in any detail at all".to_string()),
        ]);
        let out = pipeline.generate(&GenerationInput::post("anything")).await;
        assert_eq!(generator.calls(), 3);
        let table = patterns_for(EmotionalState::Neutral);
        assert!(table.iter().any(|p| p.text == out));
    }

    #[tokio::test]
    async fn test_configured_attempt_cap_is_honored() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok("nope".to_string()),
            Ok(valid_post()),
        ]));
        let persona = Arc::new(Mutex::new(EmotionalStateEngine::new(PersonaConfig {
            emotional_volatility: 0.0,
            ..PersonaConfig::default()
        })));
        let pipeline = ResponseGenerationPipeline::new(
            generator.clone(),
            Arc::new(NoStyle),
            Arc::new(MemoryStore::in_memory()),
            persona,
            PipelineConfig {
                max_attempts: 1,
                ..PipelineConfig::default()
            },
        );
        let out = pipeline.generate(&GenerationInput::post("caps")).await;
        // A single attempt: the valid second script entry is never reached.
        assert_eq!(generator.calls(), 1);
        let table = patterns_for(EmotionalState::Neutral);
        assert!(table.iter().any(|p| p.text == out));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_errors_retry_then_succeed() {
        let (pipeline, generator, _) = pipeline(vec![
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
            Ok(valid_post()),
        ]);
        let out = pipeline.generate(&GenerationInput::post("retries")).await;
        assert_eq!(out, valid_post());
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_outage_falls_back_without_error() {
        let (pipeline, generator, _) = pipeline(vec![]);
        let out = pipeline.generate(&GenerationInput::reply("ping")).await;
        assert_eq!(generator.calls(), 3);
        assert!(out.ends_with(" [neutral_state]"));
    }
}
