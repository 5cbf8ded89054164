//! Sliding-window admission control.

use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::ApiError;

/// Length of the trailing window the cap applies to.
pub const WINDOW: Duration = Duration::from_millis(1000);

/// Admits at most `max_per_window` calls in any trailing [`WINDOW`].
///
/// One instance is shared by every task issuing requests through the same
/// client. The timestamp queue is the only shared mutable state and is only
/// touched while holding `timestamps`; the lock is never held across a sleep.
pub struct SlidingWindowLimiter {
    max_per_window: usize,
    timestamps: Mutex<VecDeque<Instant>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Creates a limiter allowing `max_per_window` admissions per second.
    pub fn new(max_per_window: u32, clock: Arc<dyn Clock>) -> Result<Self, ApiError> {
        if max_per_window == 0 {
            return Err(ApiError::Config(
                "rate limit must allow at least one request per second".to_string(),
            ));
        }
        let max_per_window = max_per_window as usize;
        Ok(Self {
            max_per_window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_per_window)),
            clock,
        })
    }

    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    /// Suspends the calling task until a call may be issued, then records it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = self.clock.now();
                prune(&mut timestamps, now);

                match self.wait_needed(&timestamps, now) {
                    None => {
                        timestamps.push_back(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            // Another task may take the slot while we sleep; the next pass re-checks.
            debug!(
                "Rate limit of {}/s reached, waiting {}ms for admission",
                self.max_per_window,
                wait.as_millis()
            );
            self.clock.sleep(wait).await;
        }
    }

    /// Number of admissions currently inside the window.
    pub async fn in_window(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        prune(&mut timestamps, self.clock.now());
        timestamps.len()
    }

    fn wait_needed(&self, timestamps: &VecDeque<Instant>, now: Instant) -> Option<Duration> {
        if timestamps.len() < self.max_per_window {
            return None;
        }
        let oldest = *timestamps.front()?;
        let wait = WINDOW.saturating_sub(now.saturating_duration_since(oldest));
        if wait.is_zero() { None } else { Some(wait) }
    }
}

/// Drops timestamps that have aged out of the window. The queue is
/// oldest-first so this only ever trims a prefix.
fn prune(timestamps: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_duration_since(oldest) >= WINDOW {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}
