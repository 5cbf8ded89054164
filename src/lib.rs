pub mod api;
pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod rate_limit;

pub use config::ClientConfig;
pub use error::{ApiError, TransportFault};
pub use http::{ApiResponse, LiveSurfClient, Method};

/// Test utilities for deterministic timing.
#[cfg(test)]
pub mod test_utils {
    use crate::clock::Clock;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Clock whose time only moves when a task sleeps or a test advances it.
    /// Every requested sleep is recorded.
    pub struct ManualClock {
        origin: Instant,
        state: Mutex<ManualState>,
    }

    #[derive(Default)]
    struct ManualState {
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                state: Mutex::new(ManualState::default()),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.state.lock().unwrap().elapsed += by;
        }

        /// Total virtual time since the clock was created.
        pub fn elapsed(&self) -> Duration {
            self.state.lock().unwrap().elapsed
        }

        /// Every sleep requested so far, in order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state.lock().unwrap().sleeps.clone()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        async fn sleep(&self, duration: Duration) {
            {
                let mut state = self.state.lock().unwrap();
                state.elapsed += duration;
                state.sleeps.push(duration);
            }
            // Let other tasks observe the new time before this one resumes
            tokio::task::yield_now().await;
        }
    }
}
