//! HTTP transport for the `/config` resource.
//!
//! # Design
//! - Stateless: every call is a single request/response exchange.
//! - Only `200 OK` counts as success; every other status becomes a
//!   [`RemoteError`], using the server's `error` message when it sent one.
//! - No credentials are forwarded: the client has no cookie store and sends no
//!   authorization header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult, RemoteError};

/// Path of the configuration resource.
pub const CONFIG_PATH: &str = "/config";
/// Address of the local sync service when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3636";

/// Transport seam used by [`SettingsStore`](crate::SettingsStore).
///
/// Both operations return the response body verbatim; shaping it into a
/// [`Configuration`](crate::Configuration) is the store's job.
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    /// Read the current configuration document.
    async fn fetch_configuration(&self) -> ConfigResult<Value>;

    /// Store `value` and return the document the server kept.
    async fn persist_configuration(&self, value: &Value) -> ConfigResult<Value>;
}

/// Connection settings for [`RemoteConfigClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the sync service; `/config` is resolved against it.
    pub base_url: Url,
    /// Optional per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Settings for the given base URL without a timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
        }
    }

    /// Parse `input` as the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when `input` is not a URL.
    pub fn parse(input: &str) -> ConfigResult<Self> {
        let base_url = input
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidBaseUrl {
                value: input.to_string(),
            })?;
        Ok(Self::new(base_url))
    }

    /// Settings pointing at [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature mirrors [`Self::parse`].
    pub fn local() -> ConfigResult<Self> {
        Self::parse(DEFAULT_BASE_URL)
    }

    /// Replace the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// `reqwest` implementation of [`ConfigTransport`].
#[derive(Debug, Clone)]
pub struct RemoteConfigClient {
    http: Client,
    endpoint: Url,
}

impl RemoteConfigClient {
    /// Build a client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot address `/config` or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ConfigResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            RemoteError::transport(format!("failed to build HTTP client: {err}"))
        })?;
        Self::with_http_client(http, &config.base_url)
    }

    /// Reuse an existing HTTP client (default headers, timeouts and pools are
    /// taken as configured).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when `base_url` is not an
    /// `http`/`https` URL.
    pub fn with_http_client(http: Client, base_url: &Url) -> ConfigResult<Self> {
        let invalid = || ConfigError::InvalidBaseUrl {
            value: base_url.to_string(),
        };
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(invalid());
        }
        let endpoint = base_url.join(CONFIG_PATH).map_err(|_| invalid())?;
        Ok(Self { http, endpoint })
    }

    /// Fully resolved URL of the configuration resource.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn round_trip(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> ConfigResult<Value> {
        let response = request.send().await.map_err(|err| {
            RemoteError::transport(format!("request to {CONFIG_PATH} failed: {err}"))
        })?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "configuration round-trip completed");

        if status != StatusCode::OK {
            return Err(classify_failure(response).await.into());
        }

        let bytes = response.bytes().await.map_err(|err| {
            RemoteError::transport(format!("failed to read {CONFIG_PATH} response: {err}"))
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Decode { operation, source })
    }
}

#[async_trait]
impl ConfigTransport for RemoteConfigClient {
    async fn fetch_configuration(&self) -> ConfigResult<Value> {
        let request = self.http.get(self.endpoint.clone()).headers(json_headers());
        self.round_trip(request, "fetch").await
    }

    async fn persist_configuration(&self, value: &Value) -> ConfigResult<Value> {
        let request = self
            .http
            .put(self.endpoint.clone())
            .headers(json_headers())
            .json(value);
        self.round_trip(request, "persist").await
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Turn a non-200 response into a [`RemoteError`].
async fn classify_failure(response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();

    serde_json::from_slice::<Value>(&bytes)
        .ok()
        .as_ref()
        .and_then(|body| body.get("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map_or_else(
            || RemoteError::status(status),
            |message| RemoteError::server(status, message),
        )
}
