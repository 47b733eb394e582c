pub mod config;
pub mod error;
pub mod retry;
pub mod state;

pub use config::ThaliaConfig;
pub use error::AgentError;
pub use retry::{CycleBackoff, RetryPolicy};
pub use state::{EmotionalState, MemoryKind, NarrativeMode, Platform, PostStyle, TraitVector};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Receipt returned by the platform after a successful post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReceipt {
    pub id: String,
    pub posted_at: DateTime<Utc>,
}

/// A single post observed on the platform (own timeline or a target's).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePost {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub reposts: u32,
    pub replies: u32,
}

impl TimelinePost {
    /// Total engagement for hourly weight learning.
    pub fn engagement(&self) -> u32 {
        self.likes + self.reposts + self.replies
    }
}

/// External text generator. May fail or time out; callers wrap every
/// invocation in a retry policy.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Social platform transport. Failures must be classified into the
/// [`AgentError`] taxonomy so callers can decide on retry behavior.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn post(&self, content: &str) -> Result<PostReceipt, AgentError>;
    async fn reply(&self, in_reply_to: &str, content: &str) -> Result<PostReceipt, AgentError>;
    async fn timeline(&self) -> Result<Vec<TimelinePost>, AgentError>;
    async fn mention_timeline(&self) -> Result<Vec<TimelinePost>, AgentError>;
    async fn user_timeline(&self, username: &str) -> Result<Vec<TimelinePost>, AgentError>;
}

/// A record handed to the persistent store. The store is an external
/// collaborator; the core only requires insert/update semantics over
/// opaque JSON documents keyed by collection and id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub collection: String,
    pub id: String,
    pub body: serde_json::Value,
}

/// Persistent store contract. Failures are reported, never silently
/// swallowed, but most call sites treat them as non-fatal.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn insert(&self, record: StoredRecord) -> Result<(), AgentError>;
    async fn update(&self, record: StoredRecord) -> Result<(), AgentError>;
    async fn query(&self, collection: &str, limit: usize) -> Result<Vec<StoredRecord>, AgentError>;
}

/// No-op backend for tests and local runs without a database.
#[derive(Debug, Default, Clone)]
pub struct NullBackend;

#[async_trait]
impl MemoryBackend for NullBackend {
    async fn insert(&self, _record: StoredRecord) -> Result<(), AgentError> {
        Ok(())
    }

    async fn update(&self, _record: StoredRecord) -> Result<(), AgentError> {
        Ok(())
    }

    async fn query(&self, _collection: &str, _limit: usize) -> Result<Vec<StoredRecord>, AgentError> {
        Ok(Vec::new())
    }
}

/// Source of style/training examples used to bias generation.
/// Best-effort context, never required for correctness.
#[async_trait]
pub trait StyleSource: Send + Sync {
    async fn examples(&self, count: usize, group: &str) -> anyhow::Result<Vec<String>>;
}
