//! Reply rate limiting and per-target relationship tracking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thalia_core::config::EngagementConfig;

/// How close the persona has grown to a target, by interaction count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    New,
    Familiar,
    Close,
}

impl Relationship {
    fn for_interactions(count: u32) -> Self {
        if count > 20 {
            Relationship::Close
        } else if count > 10 {
            Relationship::Familiar
        } else {
            Relationship::New
        }
    }
}

/// An account the monitoring cycle watches and occasionally replies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementTarget {
    pub id: String,
    pub username: String,
    pub topics: Vec<String>,
    pub reply_probability: f32,
    pub last_interaction: Option<DateTime<Utc>>,
    pub relationship: Relationship,
    pub interactions: u32,
}

impl EngagementTarget {
    pub fn new(username: impl Into<String>, topics: Vec<String>, reply_probability: f32) -> Self {
        let username = username.into();
        Self {
            id: username.clone(),
            username,
            topics,
            reply_probability: reply_probability.clamp(0.0, 1.0),
            last_interaction: None,
            relationship: Relationship::New,
            interactions: 0,
        }
    }

    /// A post is interesting if any configured topic appears in it,
    /// case-insensitively.
    pub fn matches_topics(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.topics.iter().any(|t| lower.contains(&t.to_lowercase()))
    }

    pub fn record_interaction(&mut self, now: DateTime<Utc>) {
        self.interactions += 1;
        self.last_interaction = Some(now);
        self.relationship = Relationship::for_interactions(self.interactions);
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Daily per-target cap hit.
    DailyCap,
    /// Global hourly cap hit.
    HourlyCap,
    /// Last reply to this target was too recent.
    TooSoon,
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        self == RateDecision::Allowed
    }
}

/// Rolling reply history with all three caps. Timestamps older than a day
/// are pruned on every check.
pub struct EngagementRateLimiter {
    per_target: HashMap<String, Vec<DateTime<Utc>>>,
    config: EngagementConfig,
}

impl EngagementRateLimiter {
    pub fn new(config: EngagementConfig) -> Self {
        Self {
            per_target: HashMap::new(),
            config,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(24);
        for history in self.per_target.values_mut() {
            history.retain(|&t| t > cutoff);
        }
        self.per_target.retain(|_, history| !history.is_empty());
    }

    /// May we reply to `target` right now?
    pub fn check_rate_limits(&mut self, target: &str, now: DateTime<Utc>) -> RateDecision {
        self.prune(now);

        let daily = self.per_target.get(target).map_or(0, |h| h.len());
        if daily >= self.config.max_daily_replies_per_target {
            return RateDecision::DailyCap;
        }

        let hour_ago = now - Duration::hours(1);
        let hourly: usize = self
            .per_target
            .values()
            .map(|h| h.iter().filter(|&&t| t > hour_ago).count())
            .sum();
        if hourly >= self.config.max_replies_per_hour {
            return RateDecision::HourlyCap;
        }

        let last = self.per_target.get(target).and_then(|h| h.iter().max());
        if let Some(&last) = last {
            if now - last < Duration::minutes(self.config.min_reply_gap_minutes) {
                return RateDecision::TooSoon;
            }
        }
        RateDecision::Allowed
    }

    pub fn record_reply(&mut self, target: &str, now: DateTime<Utc>) {
        self.per_target.entry(target.to_string()).or_default().push(now);
    }

    pub fn replies_to(&self, target: &str) -> usize {
        self.per_target.get(target).map_or(0, |h| h.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> EngagementRateLimiter {
        EngagementRateLimiter::new(EngagementConfig::default())
    }

    #[test]
    fn test_eleventh_daily_reply_rejected() {
        let mut limiter = limiter();
        let now = Utc::now();
        for i in 0..10 {
            // Spaced out so neither the hourly cap nor the gap interferes.
            let t = now - Duration::hours(20) + Duration::minutes(i * 60);
            assert!(limiter.check_rate_limits("ada", t).is_allowed());
            limiter.record_reply("ada", t);
        }
        assert_eq!(limiter.check_rate_limits("ada", now), RateDecision::DailyCap);
        // Other targets are unaffected.
        assert!(limiter.check_rate_limits("grace", now).is_allowed());
    }

    #[test]
    fn test_hourly_cap_is_global() {
        let mut limiter = limiter();
        let now = Utc::now();
        for i in 0..30 {
            let target = format!("t{}", i / 5);
            let t = now - Duration::minutes(58) + Duration::seconds(i * 110);
            limiter.record_reply(&target, t);
        }
        assert_eq!(limiter.check_rate_limits("fresh", now), RateDecision::HourlyCap);
    }

    #[test]
    fn test_minimum_gap_between_replies() {
        let mut limiter = limiter();
        let now = Utc::now();
        limiter.record_reply("ada", now - Duration::seconds(30));
        assert_eq!(limiter.check_rate_limits("ada", now), RateDecision::TooSoon);
        // The gap is per target; a different account is not held up.
        assert!(limiter.check_rate_limits("grace", now).is_allowed());
        assert!(limiter
            .check_rate_limits("ada", now + Duration::minutes(2))
            .is_allowed());
    }

    #[test]
    fn test_history_pruned_after_a_day() {
        let mut limiter = limiter();
        let now = Utc::now();
        for i in 0..10 {
            limiter.record_reply("ada", now - Duration::hours(25) - Duration::minutes(i));
        }
        assert!(limiter.check_rate_limits("ada", now).is_allowed());
        assert_eq!(limiter.replies_to("ada"), 0);
    }

    #[test]
    fn test_relationship_progression() {
        let mut target = EngagementTarget::new("ada", vec!["math".into()], 0.5);
        let now = Utc::now();
        for _ in 0..10 {
            target.record_interaction(now);
        }
        assert_eq!(target.relationship, Relationship::New);
        target.record_interaction(now);
        assert_eq!(target.relationship, Relationship::Familiar);
        for _ in 0..10 {
            target.record_interaction(now);
        }
        assert_eq!(target.relationship, Relationship::Close);
        assert_eq!(target.last_interaction, Some(now));
    }

    #[test]
    fn test_topic_match_case_insensitive() {
        let target = EngagementTarget::new("ada", vec!["Analytical Engines".into()], 1.0);
        assert!(target.matches_topics("thoughts on analytical engines today"));
        assert!(!target.matches_topics("thoughts on difference engines"));
    }
}
