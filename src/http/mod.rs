//! HTTP layer: transport seam, outcome classification, retrying executor and client.

mod client;
mod executor;
mod retry;
mod transport;

pub use client::LiveSurfClient;
pub use executor::RequestExecutor;
pub use retry::{
    ApiResponse, Failure, INITIAL_BACKOFF_MS, MAX_RETRIES, Outcome, classify, error_message,
    is_retryable_status, parse_body,
};
pub use transport::{Method, RawResponse, RequestDescriptor, ReqwestTransport, Transport};
