//! LiveSurf API client: URL resolution on top of the request executor.

use log::debug;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backoff::BackoffPolicy;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::rate_limit::SlidingWindowLimiter;

use super::executor::RequestExecutor;
use super::retry::ApiResponse;
use super::transport::{Method, RequestDescriptor, ReqwestTransport, Transport};

/// Client for the LiveSurf API.
///
/// Cloning is cheap; clones share one rate limiter, so the per-second cap
/// holds across all of them.
#[derive(Clone)]
pub struct LiveSurfClient {
    base_url: String,
    executor: Arc<RequestExecutor>,
}

impl LiveSurfClient {
    /// Builds a client with the reqwest transport and the system clock.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.api_key, config.timeout)?;
        Self::with_parts(config, Arc::new(transport), Arc::new(SystemClock))
    }

    /// Builds a client around caller-supplied transport and clock.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let limiter = Arc::new(SlidingWindowLimiter::new(
            config.rate_limit_per_sec,
            clock.clone(),
        )?);
        let executor = RequestExecutor::new(
            transport,
            limiter,
            BackoffPolicy::new(config.initial_backoff),
            clock,
            config.max_retries,
        );
        Ok(Self {
            base_url: config.normalized_base_url(),
            executor: Arc::new(executor),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path. Leading slashes on the path are
    /// dropped; a trailing slash is kept since the API's routes end in one.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Sends one logical request, retrying transient failures.
    #[tracing::instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let descriptor = RequestDescriptor::new(method, self.endpoint_url(endpoint), body);
        debug!("{} {}...", descriptor.method, descriptor.url);
        self.executor.execute(&descriptor).await
    }

    /// [`Self::request`] that gives up with [`ApiError::Cancelled`] once
    /// `cancel` fires.
    #[tracing::instrument(skip(self, body, cancel))]
    pub async fn request_with_cancel(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        let descriptor = RequestDescriptor::new(method, self.endpoint_url(endpoint), body);
        self.executor.execute_with_cancel(&descriptor, cancel).await
    }

    /// Sends a request to an already-resolved URL.
    pub(crate) async fn request_url(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let descriptor = RequestDescriptor::new(method, url, body);
        self.executor.execute(&descriptor).await
    }

    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Get, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<ApiResponse, ApiError> {
        self.request(Method::Post, endpoint, body).await
    }

    pub async fn patch(&self, endpoint: &str, body: Option<Value>) -> Result<ApiResponse, ApiError> {
        self.request(Method::Patch, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Delete, endpoint, None).await
    }
}
