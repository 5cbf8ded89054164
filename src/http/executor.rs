//! Admission, transport, classification and retry for one logical request.

use log::{debug, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backoff::BackoffPolicy;
use crate::clock::Clock;
use crate::error::ApiError;
use crate::rate_limit::SlidingWindowLimiter;

use super::retry::{ApiResponse, Failure, Outcome, classify};
use super::transport::{RequestDescriptor, Transport};

/// Drives a [`RequestDescriptor`] to a final result.
///
/// Every attempt, retries included, takes its own slot from the limiter.
/// An unstable endpoint therefore costs up to `max_retries + 1` slots per
/// logical call.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<SlidingWindowLimiter>,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<SlidingWindowLimiter>,
        backoff: BackoffPolicy,
        clock: Arc<dyn Clock>,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            limiter,
            backoff,
            clock,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    /// Runs attempts until success, a fatal status, or the retry budget is spent.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let total_attempts = self.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            self.limiter.acquire().await;
            debug!(
                "{} {}: attempt {}/{}",
                descriptor.method,
                descriptor.url,
                attempt,
                total_attempts
            );

            match classify(self.transport.send(descriptor).await) {
                Outcome::Success(response) => {
                    if attempt > 1 {
                        debug!("{}: succeeded after {} attempts", descriptor.url, attempt);
                    }
                    return Ok(response);
                }
                Outcome::Fatal(failure) => {
                    debug!("{}: non-retryable failure: {:?}", descriptor.url, failure);
                    return Err(fatal_error(failure, attempt));
                }
                Outcome::Retryable(failure) if attempt <= self.max_retries => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        "{} {}: attempt {}/{} failed ({}), retrying in {}ms...",
                        descriptor.method,
                        descriptor.url,
                        attempt,
                        total_attempts,
                        describe(&failure),
                        delay.as_millis()
                    );
                    self.clock.sleep(delay).await;
                }
                Outcome::Retryable(failure) => {
                    return Err(exhausted_error(failure, attempt));
                }
            }
        }
    }

    /// Like [`Self::execute`], but resolves to [`ApiError::Cancelled`] as soon
    /// as `cancel` fires, whichever suspension point the request is in.
    pub async fn execute_with_cancel(
        &self,
        descriptor: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("{} {}: cancelled", descriptor.method, descriptor.url);
                Err(ApiError::Cancelled)
            }
            result = self.execute(descriptor) => result,
        }
    }
}

fn describe(failure: &Failure) -> String {
    match failure {
        Failure::Status { status, message } => format!("HTTP {}: {}", status, message),
        Failure::Transport(fault) => fault.to_string(),
    }
}

fn fatal_error(failure: Failure, attempts: u32) -> ApiError {
    match failure {
        Failure::Status { status, message } => ApiError::NonRetryable { status, message },
        Failure::Transport(_) => exhausted_error(failure, attempts),
    }
}

fn exhausted_error(failure: Failure, attempts: u32) -> ApiError {
    match failure {
        Failure::Status { status, message } => ApiError::ExhaustedRetries {
            status: Some(status),
            message,
            attempts,
            source: None,
        },
        Failure::Transport(fault) => ApiError::ExhaustedRetries {
            status: None,
            message: fault.to_string(),
            attempts,
            source: Some(fault),
        },
    }
}
