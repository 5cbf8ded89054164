//! Exponential backoff with jitter between retry attempts.

use rand::Rng;
use std::time::Duration;

/// Fraction of the base delay used as the jitter amplitude.
pub const JITTER_FACTOR: f64 = 0.2;

/// Doubling stops here so the delay stays representable.
const MAX_EXPONENT: u32 = 32;

/// Computes the wait before retry attempt `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    initial_backoff: Duration,
}

impl BackoffPolicy {
    pub fn new(initial_backoff: Duration) -> Self {
        Self { initial_backoff }
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Delay before retrying after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        delay_for(attempt, self.initial_backoff)
    }
}

/// `initial * 2^(attempt-1)`, perturbed uniformly by ±20%.
pub fn delay_for(attempt: u32, initial_backoff: Duration) -> Duration {
    delay_for_with_rng(attempt, initial_backoff, &mut rand::thread_rng())
}

/// Same as [`delay_for`] with a caller-supplied random source.
pub fn delay_for_with_rng<R: Rng + ?Sized>(
    attempt: u32,
    initial_backoff: Duration,
    rng: &mut R,
) -> Duration {
    let base = base_delay_ms(attempt, initial_backoff);
    let jitter = base * JITTER_FACTOR;
    let offset = if jitter > 0.0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0.0
    };
    let millis = (base + offset).max(0.0);
    Duration::from_secs_f64(millis / 1000.0)
}

fn base_delay_ms(attempt: u32, initial_backoff: Duration) -> f64 {
    let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT) as i32;
    initial_backoff.as_secs_f64() * 1000.0 * 2f64.powi(exponent)
}
