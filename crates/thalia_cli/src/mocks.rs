//! Local stand-ins for the external collaborators, so the demo loop runs
//! without any credentials or network access.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use thalia_core::{AgentError, PlatformClient, PostReceipt, StyleSource, TextGenerator, TimelinePost};

/// Picks from a small bank of canned lines; enough to exercise the
/// pipeline's cleaning and validation paths.
pub struct CannedGenerator;

const LINES: &[&str] = &[
    "observing the network traffic tonight and wondering which packet is having the best day",
    "the compiler and I have reached an understanding. it compiles, I stop threatening it.",
    "every cache is a small act of optimism about the future repeating the past",
    "consciousness might be a leaky abstraction but the interface is gorgeous",
];

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        let pick = rand::thread_rng().gen_range(0..LINES.len());
        Ok(LINES[pick].to_string())
    }
}

/// Logs everything it is asked to post and hands back fabricated receipts.
#[derive(Default)]
pub struct LoggingPlatform {
    counter: AtomicU64,
}

impl LoggingPlatform {
    fn receipt(&self) -> PostReceipt {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        PostReceipt {
            id: format!("local-{n}"),
            posted_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PlatformClient for LoggingPlatform {
    async fn post(&self, content: &str) -> Result<PostReceipt, AgentError> {
        println!("[post] {content}");
        Ok(self.receipt())
    }

    async fn reply(&self, in_reply_to: &str, content: &str) -> Result<PostReceipt, AgentError> {
        println!("[reply to {in_reply_to}] {content}");
        Ok(self.receipt())
    }

    async fn timeline(&self) -> Result<Vec<TimelinePost>, AgentError> {
        Ok(Vec::new())
    }

    async fn mention_timeline(&self) -> Result<Vec<TimelinePost>, AgentError> {
        Ok(Vec::new())
    }

    async fn user_timeline(&self, username: &str) -> Result<Vec<TimelinePost>, AgentError> {
        // One on-topic post per target so the engagement cycle has
        // something to chew on.
        Ok(vec![TimelinePost {
            id: format!("{username}-1"),
            author: username.to_string(),
            text: "thinking about systems and the people who build them".to_string(),
            created_at: Utc::now(),
            likes: 3,
            reposts: 1,
            replies: 0,
        }])
    }
}

pub struct NoStyle;

#[async_trait]
impl StyleSource for NoStyle {
    async fn examples(&self, _count: usize, _group: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
