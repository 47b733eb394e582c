//! Generation requests and prompt assembly.

use thalia_core::config::PipelineConfig;
use thalia_core::Platform;
use thalia_memory::MemoryRecord;
use thalia_persona::PersonaSnapshot;

/// What shape of output the caller wants; drives the length constraints and
/// whether a trailing state marker is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Standalone social post, 50..=180 chars, no marker.
    Post,
    /// Conversational reply, <=280 chars, marker appended.
    Reply,
}

/// One unit of work for the pipeline.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub stimulus: String,
    pub kind: OutputKind,
    pub platform: Platform,
}

impl GenerationInput {
    pub fn post(topic: impl Into<String>) -> Self {
        Self {
            stimulus: topic.into(),
            kind: OutputKind::Post,
            platform: Platform::Social,
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            stimulus: text.into(),
            kind: OutputKind::Reply,
            platform: Platform::Social,
        }
    }

    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            stimulus: text.into(),
            kind: OutputKind::Reply,
            platform: Platform::Chat,
        }
    }
}

/// Assemble the generator prompt from the persona snapshot and whatever
/// context was available. Every section is optional except the task line.
pub(crate) fn build_prompt(
    input: &GenerationInput,
    snapshot: &PersonaSnapshot,
    recent: &[MemoryRecord],
    related: &[MemoryRecord],
    examples: &[String],
    config: &PipelineConfig,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are an autonomous online persona. Current emotional state: {}. \
         Post style: {}. Narrative mode: {:?}.\n",
        snapshot.state, snapshot.post_style, snapshot.narrative_mode
    ));
    prompt.push_str("Trait dials (0..1):");
    for (id, value) in snapshot.traits.iter() {
        prompt.push_str(&format!(" {}={:.2}", id.as_str(), value));
    }
    prompt.push('\n');

    if !recent.is_empty() {
        prompt.push_str("Recent memories:\n");
        for record in recent {
            prompt.push_str(&format!("- {}\n", record.content));
        }
    }
    if !related.is_empty() {
        prompt.push_str("Related memories:\n");
        for record in related {
            prompt.push_str(&format!("- {}\n", record.content));
        }
    }
    if !examples.is_empty() {
        prompt.push_str("Voice examples:\n");
        for example in examples {
            prompt.push_str(&format!("- {}\n", example));
        }
    }

    match input.kind {
        OutputKind::Post => prompt.push_str(&format!(
            "Write one social post about: {}. Plain text, {}-{} characters, \
             no hashtags, no emoji.\n",
            input.stimulus, config.post_min_chars, config.post_max_chars
        )),
        OutputKind::Reply => prompt.push_str(&format!(
            "Reply in character to: {}. Plain text, at most {} characters, \
             no hashtags, no emoji.\n",
            input.stimulus, config.reply_max_chars
        )),
    }
    prompt
}
