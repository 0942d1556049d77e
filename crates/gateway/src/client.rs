//! Shared HTTP client for the roleplay backend

use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use rpchat_chats::types::ApiErrorBody;
use rpchat_config::ApiConfig;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed client for the backend's REST and streaming endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> GatewayResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GatewayError::InvalidUrl(base_url));
        }

        // No client-wide timeout: it would also cut off long-lived event streams.
        let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout,
        })
    }

    pub fn from_config(config: &ApiConfig) -> GatewayResult<Self> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builder for a bounded REST request.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "backend request");
        self.http
            .request(method, self.url(path))
            .timeout(self.request_timeout)
    }

    /// Builder for the unbounded event stream request.
    pub(crate) fn stream_request(&self, path: &str) -> RequestBuilder {
        debug!(path, "opening event stream");
        self.http
            .get(self.url(path))
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
    }

    /// Send and turn non-success statuses into [`GatewayError::Status`].
    pub(crate) async fn execute(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> GatewayResult<Response> {
        let response = request.send().await?;
        check_status(method, path, response).await
    }

    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> GatewayResult<T> {
        let response = self.execute(method, path, request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(GatewayError::from)
    }
}

pub(crate) async fn check_status(
    method: &'static str,
    path: &str,
    response: Response,
) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    Err(GatewayError::Status {
        method,
        path: path.to_string(),
        status,
        message,
    })
}
