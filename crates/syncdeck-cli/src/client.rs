//! Shared client utilities and the CLI error model.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use syncdeck_config::{ConfigError, RemoteConfigClient, RemoteError, SettingsStore};

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::InvalidField { .. }
            | ConfigError::UnknownField { .. }
            | ConfigError::InvalidBaseUrl { .. } => Self::validation(error.to_string()),
            ConfigError::Remote(remote) => classify_remote(remote),
            other => Self::failure(other),
        }
    }
}

/// Client errors the user can fix are validation failures; everything else
/// is operational. Server messages get the status appended unless they are
/// the generic status message already.
fn classify_remote(remote: RemoteError) -> CliError {
    match remote.status {
        Some(400 | 409 | 422) => CliError::validation(remote.message),
        Some(status) if remote.message != RemoteError::status(status).message => {
            CliError::failure(anyhow!("{} (status {status})", remote.message))
        }
        _ => CliError::failure(remote),
    }
}

/// Build the shared HTTP client: request timeout plus a per-invocation
/// `x-request-id` header.
pub(crate) fn build_http_client(timeout_secs: u64, trace_id: &str) -> CliResult<Client> {
    let mut default_headers = HeaderMap::new();
    let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
        CliError::failure(anyhow!("trace identifier contains invalid characters"))
    })?;
    default_headers.insert(HEADER_REQUEST_ID, request_id);

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(default_headers)
        .build()
        .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
}

impl AppContext {
    /// Settings store talking to the configured service. The store starts from
    /// the section baselines; commands load before they edit.
    pub(crate) fn settings_store(&self) -> CliResult<SettingsStore> {
        let transport = RemoteConfigClient::with_http_client(self.client.clone(), &self.base_url)?;
        Ok(SettingsStore::new(transport, &Value::Null)?)
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Split a `Section.Field=value` argument.
pub(crate) fn parse_assignment(input: &str) -> CliResult<(&str, &str)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| CliError::validation(format!("expected KEY=VALUE, got '{input}'")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::validation(format!(
            "assignment '{input}' is missing a key"
        )));
    }
    Ok((key, value))
}
