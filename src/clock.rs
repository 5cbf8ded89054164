//! Time source and sleep primitive used by the limiter and the retry loop.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Supplies the current instant and a task-level sleep.
///
/// Sleeping must suspend only the calling task. The production clock is
/// backed by `tokio::time`; tests drive time by hand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
