//! Error types for configuration round-trips.

use thiserror::Error;

/// Normalized failure of a configuration round-trip.
///
/// Produced for any non-200 response and for transport failures. When the
/// server supplied an `{"error": "..."}` body, `message` carries that text
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// Human-readable failure description.
    pub message: String,
    /// HTTP status code, absent for transport failures.
    pub status: Option<u16>,
}

impl RemoteError {
    /// Failure reported by the server with an explicit message.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Failure reported by the server without a usable error body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            message: format!("request failed with status {status}"),
            status: Some(status),
        }
    }

    /// Failure before any response was received.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }
}

/// Primary error type for settings operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The remote configuration endpoint reported a failure.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// A successful response did not fit the configuration shape.
    #[error("failed to decode configuration")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// Source decoding error.
        source: serde_json::Error,
    },
    /// The in-memory configuration could not be serialized.
    #[error("failed to encode configuration")]
    Encode {
        /// Source encoding error.
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field {section}.{field}: {reason}")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Field did not exist in the target section.
    #[error("unknown configuration field {section}.{field}")]
    UnknownField {
        /// Section where the unknown field was encountered.
        section: String,
        /// Name of the unexpected field.
        field: String,
    },
    /// The configured endpoint base URL cannot address `/config`.
    #[error("invalid base URL '{value}'")]
    InvalidBaseUrl {
        /// Base URL payload provided by the caller.
        value: String,
    },
}

impl ConfigError {
    /// Returns the remote failure when this error came from the server.
    #[must_use]
    pub const fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
