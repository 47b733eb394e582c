//! Outbound engagement: the posting queue and scheduler, the per-target
//! rate limiter, and the periodic monitoring cycle that replies to
//! followed accounts.

pub mod floor;
pub mod limiter;
pub mod monitor;
pub mod queue;
pub mod scheduler;

pub use floor::PostFloor;
pub use limiter::{EngagementRateLimiter, EngagementTarget, RateDecision, Relationship};
pub use monitor::{CycleOutcome, EngagementMonitor};
pub use queue::{PostQueue, PostStatus, QueueStats, QueuedPost};
pub use scheduler::{optimal_post_time, HourlyWeights, PostingScheduler};
