//! Minimum spacing between anything the agent puts on the wire.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared floor between scheduled posts and immediate replies. A sender
/// waits until the gap since the last send has elapsed, then marks its
/// own send once it lands.
pub struct PostFloor {
    last: Mutex<Option<Instant>>,
    gap: Duration,
}

impl PostFloor {
    pub fn new(minutes: u64) -> Self {
        Self {
            last: Mutex::new(None),
            gap: Duration::from_secs(minutes * 60),
        }
    }

    /// Sleep until the gap since the last marked send has passed. Returns
    /// immediately if nothing has been sent yet.
    pub async fn wait(&self) {
        let last = *self.last.lock().await;
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < self.gap {
                tokio::time::sleep(self.gap - elapsed).await;
            }
        }
    }

    pub async fn mark(&self) {
        *self.last.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_noop_before_first_send() {
        let floor = PostFloor::new(2);
        let start = Instant::now();
        floor.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_holds_for_the_gap() {
        let floor = PostFloor::new(2);
        floor.mark().await;
        let start = Instant::now();
        floor.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(120));
    }
}
