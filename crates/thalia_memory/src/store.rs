//! Tiered memory store: short-term FIFO tier, long-term importance tier,
//! periodic consolidation, exponential decay, and associative retrieval.

use crate::analysis::Timeframe;
use crate::record::{MemoryPattern, MemoryRecord};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use thalia_core::config::MemoryConfig;
use thalia_core::{
    AgentError, EmotionalState, MemoryBackend, MemoryKind, NullBackend, Platform, StoredRecord,
};

const MEMORY_COLLECTION: &str = "memories";

/// Outcome of one consolidation sweep.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationStats {
    pub promoted: usize,
    pub trimmed: usize,
}

struct Tiers {
    short_term: VecDeque<MemoryRecord>,
    long_term: Vec<MemoryRecord>,
    patterns: Vec<MemoryPattern>,
}

/// The memory store owns every record exclusively. Callers get clones.
pub struct MemoryStore {
    tiers: RwLock<Tiers>,
    backend: Arc<dyn MemoryBackend>,
    config: MemoryConfig,
}

impl MemoryStore {
    pub fn new(backend: Arc<dyn MemoryBackend>, config: MemoryConfig) -> Self {
        Self {
            tiers: RwLock::new(Tiers {
                short_term: VecDeque::new(),
                long_term: Vec::new(),
                patterns: Vec::new(),
            }),
            backend,
            config,
        }
    }

    /// In-memory store with a no-op backend, for tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(NullBackend), MemoryConfig::default())
    }

    /// Record a new memory into the short-term tier. The 101st insert
    /// evicts the oldest entry.
    pub async fn add_memory(
        &self,
        content: &str,
        kind: MemoryKind,
        emotional_context: EmotionalState,
        platform: Platform,
    ) -> MemoryRecord {
        self.add_memory_at(content, kind, emotional_context, platform, Utc::now())
            .await
    }

    /// Like [`add_memory`] with an explicit timestamp. Used by tests and by
    /// backfill from the persistent store.
    pub async fn add_memory_at(
        &self,
        content: &str,
        kind: MemoryKind,
        emotional_context: EmotionalState,
        platform: Platform,
        timestamp: DateTime<Utc>,
    ) -> MemoryRecord {
        let record = MemoryRecord::new(content, kind, emotional_context, platform, timestamp);

        {
            let mut tiers = self.tiers.write().await;
            tiers.short_term.push_back(record.clone());
            while tiers.short_term.len() > self.config.short_term_capacity {
                let evicted = tiers.short_term.pop_front();
                if let Some(evicted) = evicted {
                    tracing::debug!("Short-term tier full, evicted {}", evicted.id);
                }
            }
        }

        self.persist_insert(&record).await;
        record
    }

    /// Promote aged, important short-term memories to long-term and trim
    /// the long-term tier back under capacity by ascending importance.
    /// Backend failures are logged and do not halt the sweep.
    pub async fn consolidate(&self) -> ConsolidationStats {
        self.consolidate_at(Utc::now()).await
    }

    pub async fn consolidate_at(&self, now: DateTime<Utc>) -> ConsolidationStats {
        let mut stats = ConsolidationStats::default();
        let mut promoted = Vec::new();

        {
            let mut tiers = self.tiers.write().await;
            let one_hour = ChronoDuration::hours(1);
            let mut remaining = VecDeque::with_capacity(tiers.short_term.len());
            while let Some(record) = tiers.short_term.pop_front() {
                if now - record.timestamp > one_hour && record.importance > 0.7 {
                    promoted.push(record.clone());
                    tiers.long_term.push(record);
                } else {
                    remaining.push_back(record);
                }
            }
            tiers.short_term = remaining;
            stats.promoted = promoted.len();

            if tiers.long_term.len() > self.config.long_term_capacity {
                tiers
                    .long_term
                    .sort_by(|a, b| b.importance.total_cmp(&a.importance));
                stats.trimmed = tiers.long_term.len() - self.config.long_term_capacity;
                tiers.long_term.truncate(self.config.long_term_capacity);
            }
        }

        for record in &promoted {
            if let Err(e) = self.persist_update(record).await {
                tracing::warn!(
                    "{}",
                    AgentError::Consolidation(format!("persisting {}: {}", record.id, e))
                );
            }
        }

        if stats.promoted > 0 || stats.trimmed > 0 {
            tracing::info!(
                "Consolidation: promoted {} to long-term, trimmed {}",
                stats.promoted,
                stats.trimmed
            );
        }
        stats
    }

    /// Exponentially decay long-term importance (half-life scale 30 days)
    /// and prune entries that fell below 0.1.
    pub async fn decay(&self) -> usize {
        self.decay_at(Utc::now()).await
    }

    pub async fn decay_at(&self, now: DateTime<Utc>) -> usize {
        let mut tiers = self.tiers.write().await;
        for record in tiers.long_term.iter_mut() {
            let age_days = record.age_days(now);
            record.importance *= (-age_days / 30.0).exp() as f32;
        }
        let before = tiers.long_term.len();
        tiers.long_term.retain(|r| r.importance >= 0.1);
        let pruned = before - tiers.long_term.len();
        if pruned > 0 {
            tracing::debug!("Decay pruned {} faded memories", pruned);
        }
        pruned
    }

    /// Filter both tiers by the supplied predicates, sorted by descending
    /// importance, top `limit`.
    pub async fn query(
        &self,
        kind: Option<MemoryKind>,
        emotional_context: Option<EmotionalState>,
        platform: Option<Platform>,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        let tiers = self.tiers.read().await;
        let mut hits: Vec<MemoryRecord> = tiers
            .short_term
            .iter()
            .chain(tiers.long_term.iter())
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .filter(|r| emotional_context.map_or(true, |e| r.emotional_context == e))
            .filter(|r| platform.map_or(true, |p| r.platform == p))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        hits.truncate(limit);
        hits
    }

    /// Associative retrieval: relevance of a record is the number of words
    /// of `text` found as substrings of its content.
    pub async fn associated(&self, text: &str, limit: usize) -> Vec<MemoryRecord> {
        let words: Vec<String> = text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let tiers = self.tiers.read().await;
        let mut scored: Vec<(usize, MemoryRecord)> = tiers
            .short_term
            .iter()
            .chain(tiers.long_term.iter())
            .map(|r| {
                let content = r.content.to_lowercase();
                let relevance = words.iter().filter(|w| content.contains(w.as_str())).count();
                (relevance, r.clone())
            })
            .filter(|(relevance, _)| *relevance > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, r)| r).collect()
    }

    /// Logically archive memories older than the retention window with
    /// importance at most 0.8. Deletion is delegated to the backend; the
    /// active working set just drops them. Idempotent.
    pub async fn archive(&self) -> usize {
        self.archive_at(Utc::now()).await
    }

    pub async fn archive_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - ChronoDuration::days(self.config.retention_days);
        let mut archived = Vec::new();

        {
            let mut tiers = self.tiers.write().await;
            let mut keep_short = VecDeque::with_capacity(tiers.short_term.len());
            while let Some(record) = tiers.short_term.pop_front() {
                if record.timestamp < cutoff && record.importance <= 0.8 {
                    archived.push(record);
                } else {
                    keep_short.push_back(record);
                }
            }
            tiers.short_term = keep_short;

            let mut keep_long = Vec::with_capacity(tiers.long_term.len());
            for record in tiers.long_term.drain(..) {
                if record.timestamp < cutoff && record.importance <= 0.8 {
                    archived.push(record);
                } else {
                    keep_long.push(record);
                }
            }
            tiers.long_term = keep_long;
        }

        for record in archived.iter_mut() {
            record.archived = true;
            if let Err(e) = self.persist_update(record).await {
                tracing::warn!("Archiving {} not persisted: {}", record.id, e);
            }
        }

        if !archived.is_empty() {
            tracing::info!("Archived {} memories past retention", archived.len());
        }
        archived.len()
    }

    /// Rebuild derived patterns from the whole corpus: any word occurring
    /// at least three times becomes a pattern.
    pub async fn rebuild_patterns(&self) {
        let mut tiers = self.tiers.write().await;
        let mut freq: HashMap<String, (usize, DateTime<Utc>, BTreeSet<EmotionalState>)> =
            HashMap::new();

        for record in tiers.short_term.iter().chain(tiers.long_term.iter()) {
            for word in record.content.to_lowercase().split_whitespace() {
                let entry = freq
                    .entry(word.to_string())
                    .or_insert((0, record.timestamp, BTreeSet::new()));
                entry.0 += 1;
                entry.1 = entry.1.max(record.timestamp);
                entry.2.insert(record.emotional_context);
            }
        }

        let mut patterns: Vec<MemoryPattern> = freq
            .into_iter()
            .filter(|(_, (count, _, _))| *count >= 3)
            .map(|(pattern, (frequency, last_occurrence, associated_emotions))| MemoryPattern {
                pattern,
                frequency,
                last_occurrence,
                associated_emotions,
                importance: 0.5,
            })
            .collect();
        patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        tiers.patterns = patterns;
    }

    pub async fn patterns(&self) -> Vec<MemoryPattern> {
        self.tiers.read().await.patterns.clone()
    }

    /// Emotional contexts of the `n` most recent records, newest first.
    pub async fn recent_emotions(&self, n: usize) -> Vec<EmotionalState> {
        let tiers = self.tiers.read().await;
        let mut records: Vec<&MemoryRecord> = tiers
            .short_term
            .iter()
            .chain(tiers.long_term.iter())
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
            .into_iter()
            .take(n)
            .map(|r| r.emotional_context)
            .collect()
    }

    /// Top-5 most important long-term memories within the timeframe,
    /// joined by newlines.
    pub async fn summarize(&self, timeframe: Timeframe) -> String {
        self.summarize_at(timeframe, Utc::now()).await
    }

    pub async fn summarize_at(&self, timeframe: Timeframe, now: DateTime<Utc>) -> String {
        let window = timeframe.window();
        let tiers = self.tiers.read().await;
        let mut relevant: Vec<&MemoryRecord> = tiers
            .long_term
            .iter()
            .filter(|r| now - r.timestamp < window)
            .collect();
        relevant.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        relevant
            .iter()
            .take(5)
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn short_term_len(&self) -> usize {
        self.tiers.read().await.short_term.len()
    }

    pub async fn long_term_len(&self) -> usize {
        self.tiers.read().await.long_term.len()
    }

    /// Place a record directly into the long-term tier (backfill path).
    pub async fn insert_long_term(&self, record: MemoryRecord) {
        let mut tiers = self.tiers.write().await;
        tiers.long_term.push(record);
    }

    async fn persist_insert(&self, record: &MemoryRecord) {
        let stored = match Self::to_stored(record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Memory {} not serializable: {}", record.id, e);
                return;
            }
        };
        if let Err(e) = self.backend.insert(stored).await {
            tracing::warn!("Memory {} not persisted: {}", record.id, e);
        }
    }

    async fn persist_update(&self, record: &MemoryRecord) -> Result<(), AgentError> {
        let stored =
            Self::to_stored(record).map_err(|e| AgentError::Data(e.to_string()))?;
        self.backend.update(stored).await
    }

    fn to_stored(record: &MemoryRecord) -> serde_json::Result<StoredRecord> {
        Ok(StoredRecord {
            collection: MEMORY_COLLECTION.to_string(),
            id: record.id.to_string(),
            body: serde_json::to_value(record)?,
        })
    }
}
