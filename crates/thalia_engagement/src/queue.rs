//! The post queue and its status machine.
//!
//! Statuses move along a strict graph; illegal jumps are programming
//! errors at the call site and come back as validation failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thalia_core::{AgentError, PostStyle};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Pending,
    Approved,
    Scheduled,
    Posted,
    Rejected,
    Failed,
}

impl PostStatus {
    /// Legal edges: Pending -> Approved | Rejected, Approved -> Scheduled,
    /// Scheduled -> Posted | Failed, Failed -> Scheduled.
    pub fn can_transition_to(self, next: PostStatus) -> bool {
        use PostStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Scheduled)
                | (Scheduled, Posted)
                | (Scheduled, Failed)
                | (Failed, Scheduled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Posted | PostStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPost {
    pub id: Uuid,
    pub content: String,
    pub style: PostStyle,
    pub status: PostStatus,
    pub generated_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Failed post attempts so far; retries stop once this hits the cap.
    pub attempts: u32,
}

impl QueuedPost {
    pub fn new(content: impl Into<String>, style: PostStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            style,
            status: PostStatus::Pending,
            generated_at: Utc::now(),
            scheduled_for: None,
            attempts: 0,
        }
    }
}

/// Cumulative transition counters plus a view of what is live in the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub scheduled: usize,
    pub approved: u64,
    pub rejected: u64,
    pub posted: u64,
    pub failed: u64,
}

#[derive(Default)]
pub struct PostQueue {
    posts: Vec<QueuedPost>,
    approved: u64,
    rejected: u64,
    posted: u64,
    failed: u64,
}

impl PostQueue {
    pub fn push(&mut self, post: QueuedPost) -> Uuid {
        let id = post.id;
        self.posts.push(post);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&QueuedPost> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut QueuedPost> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    /// Move a post to `next`, enforcing the status machine.
    pub fn transition(&mut self, id: Uuid, next: PostStatus) -> Result<(), AgentError> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AgentError::Data(format!("no queued post {id}")))?;
        if !post.status.can_transition_to(next) {
            return Err(AgentError::Validation(format!(
                "illegal status transition {:?} -> {:?} for post {id}",
                post.status, next
            )));
        }
        post.status = next;
        match next {
            PostStatus::Approved => self.approved += 1,
            PostStatus::Rejected => self.rejected += 1,
            PostStatus::Posted => self.posted += 1,
            PostStatus::Failed => self.failed += 1,
            _ => {}
        }
        Ok(())
    }

    pub fn remove(&mut self, id: Uuid) -> Option<QueuedPost> {
        let idx = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(idx))
    }

    /// Drop every rejected post, returning how many went.
    pub fn clear_rejected(&mut self) -> usize {
        let before = self.posts.len();
        self.posts.retain(|p| p.status != PostStatus::Rejected);
        before - self.posts.len()
    }

    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.posts
            .iter()
            .filter(|p| p.status == PostStatus::Pending)
            .map(|p| p.id)
            .collect()
    }

    /// The scheduled post due soonest, if any.
    pub fn next_due(&self) -> Option<&QueuedPost> {
        self.next_due_excluding(None)
    }

    /// Like [`next_due`](Self::next_due), but skipping a post that is
    /// already mid-delivery and must not be picked up again.
    pub fn next_due_excluding(&self, skip: Option<Uuid>) -> Option<&QueuedPost> {
        self.posts
            .iter()
            .filter(|p| p.status == PostStatus::Scheduled && Some(p.id) != skip)
            .min_by_key(|p| p.scheduled_for)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self
                .posts
                .iter()
                .filter(|p| p.status == PostStatus::Pending)
                .count(),
            scheduled: self
                .posts
                .iter()
                .filter(|p| p.status == PostStatus::Scheduled)
                .count(),
            approved: self.approved,
            rejected: self.rejected,
            posted: self.posted,
            failed: self.failed,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
