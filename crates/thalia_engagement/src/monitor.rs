//! The periodic engagement cycle: scan target timelines, reply to
//! on-topic posts when the dice and the rate limits allow it.

use crate::floor::PostFloor;
use crate::limiter::{EngagementRateLimiter, EngagementTarget};
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thalia_core::config::EngagementConfig;
use thalia_core::{AgentError, CycleBackoff, PlatformClient};
use thalia_pipeline::{GenerationInput, ResponseGenerationPipeline};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle ran to completion with this many replies sent.
    Completed(usize),
    /// A cycle was already in flight; this trigger was a no-op.
    Skipped,
    /// The cycle aborted on a transport error.
    Failed,
}

#[derive(Clone)]
pub struct EngagementMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    platform: Arc<dyn PlatformClient>,
    pipeline: Arc<ResponseGenerationPipeline>,
    targets: Mutex<Vec<EngagementTarget>>,
    limiter: Mutex<EngagementRateLimiter>,
    /// Shared with the posting scheduler so replies respect the same
    /// spacing floor as scheduled posts.
    floor: Arc<PostFloor>,
    is_running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    config: EngagementConfig,
}

impl EngagementMonitor {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        pipeline: Arc<ResponseGenerationPipeline>,
        floor: Arc<PostFloor>,
        config: EngagementConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                platform,
                pipeline,
                targets: Mutex::new(Vec::new()),
                limiter: Mutex::new(EngagementRateLimiter::new(config.clone())),
                floor,
                is_running: AtomicBool::new(false),
                task: Mutex::new(None),
                config,
            }),
        }
    }

    pub async fn add_target(&self, target: EngagementTarget) {
        self.inner.targets.lock().await.push(target);
    }

    pub async fn targets(&self) -> Vec<EngagementTarget> {
        self.inner.targets.lock().await.clone()
    }

    /// Run one cycle now. Reentrancy-safe: a cycle already in flight makes
    /// this a no-op.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.inner.run_cycle().await
    }

    /// Spawn the periodic loop. Failed cycles back off exponentially;
    /// successful ones return to the configured cadence.
    pub async fn start(&self) {
        let mut slot = self.inner.task.lock().await;
        if slot.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *slot = Some(tokio::spawn(async move {
            let mut backoff = CycleBackoff::monitoring();
            loop {
                let delay = match inner.run_cycle().await {
                    CycleOutcome::Failed => backoff.on_failure(),
                    _ => {
                        backoff.on_success();
                        Duration::from_secs(inner.config.cycle_minutes * 60)
                    }
                };
                tokio::time::sleep(delay).await;
            }
        }));
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.inner.task.lock().await.take() {
            handle.abort();
        }
    }
}

impl Inner {
    async fn run_cycle(&self) -> CycleOutcome {
        if self.is_running.swap(true, Ordering::SeqCst) {
            tracing::debug!("engagement cycle already in flight");
            return CycleOutcome::Skipped;
        }
        let result = self.cycle().await;
        self.is_running.store(false, Ordering::SeqCst);
        match result {
            Ok(replies) => {
                tracing::info!(replies, "engagement cycle complete");
                CycleOutcome::Completed(replies)
            }
            Err(err) => {
                tracing::warn!("engagement cycle failed: {err}");
                CycleOutcome::Failed
            }
        }
    }

    async fn cycle(&self) -> Result<usize, AgentError> {
        let targets = self.targets.lock().await.clone();
        let mut replies = 0usize;
        for target in targets {
            let posts = self.platform.user_timeline(&target.username).await?;
            for post in posts {
                if !target.matches_topics(&post.text) {
                    continue;
                }
                if rand::thread_rng().gen::<f32>() >= target.reply_probability {
                    continue;
                }
                let now = Utc::now();
                let decision = self
                    .limiter
                    .lock()
                    .await
                    .check_rate_limits(&target.username, now);
                if !decision.is_allowed() {
                    tracing::debug!(target = %target.username, ?decision, "reply suppressed");
                    continue;
                }
                let reply = self
                    .pipeline
                    .generate(&GenerationInput::reply(post.text.clone()))
                    .await;
                self.floor.wait().await;
                self.platform.reply(&post.id, &reply).await?;
                self.floor.mark().await;
                self.limiter.lock().await.record_reply(&target.username, now);
                {
                    let mut targets = self.targets.lock().await;
                    if let Some(t) = targets.iter_mut().find(|t| t.id == target.id) {
                        t.record_interaction(now);
                    }
                }
                replies += 1;
                // One reply per target per cycle keeps the account from
                // dogpiling anyone's timeline.
                break;
            }
        }
        Ok(replies)
    }
}
