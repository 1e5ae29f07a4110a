use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by every Polar API operation.
pub type PolarResult<T> = Result<T, PolarError>;

/// Transport-level failure details.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("{0}")]
    Reqwest(Arc<reqwest::Error>),

    #[error("response decode error: {0}")]
    Decode(String),
}

/// A single field error from a validation failure.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValidationDetail {
    /// Location of the offending field, e.g. `["body", "email"]`
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    /// Human readable message
    #[serde(default)]
    pub msg: String,
    /// Machine readable error type, e.g. `value_error`
    #[serde(default, rename = "type")]
    pub error_type: String,
}

impl ValidationDetail {
    pub fn new(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![serde_json::Value::String(field.into())],
            msg: msg.into(),
            error_type: "value_error".to_string(),
        }
    }

    /// Dotted field path, e.g. `body.email`.
    pub fn field(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Coarse failure class, for callers that branch on the kind of failure
/// rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    RateLimit,
    Server,
    Network,
    Api,
    Decode,
    Config,
    Signature,
}

/// Polar SDK error types
#[derive(Debug, Error)]
pub enum PolarError {
    #[error("HTTP request error: {0}")]
    Http(HttpError),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("authentication error (status={status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("server error (status={status}): {message}")]
    Server { status: u16, message: String },

    #[error("Polar API error (status={status}, error={error}): {message}")]
    Api {
        status: u16,
        error: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),
}

impl From<reqwest::Error> for PolarError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PolarError::Timeout(e.to_string());
        }
        if e.is_builder() {
            return PolarError::Config(e.to_string());
        }
        PolarError::Http(HttpError::Reqwest(Arc::new(e)))
    }
}

/// Error body shape for non-validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl PolarError {
    /// Client-side validation failure for a single field.
    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        PolarError::Validation {
            message: format!("{field}: {msg}"),
            details: vec![ValidationDetail::new(field, msg)],
        }
    }

    /// Build a typed error from a non-2xx response status and its raw body.
    pub fn from_response(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let error = parsed
            .as_ref()
            .and_then(|b| b.error.clone())
            .unwrap_or_default();
        let detail = parsed.and_then(|b| b.detail);

        let details: Vec<ValidationDetail> = match &detail {
            Some(value @ serde_json::Value::Array(_)) => {
                serde_json::from_value(value.clone()).unwrap_or_default()
            }
            _ => Vec::new(),
        };

        let message = match &detail {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(_)) if !details.is_empty() => details
                .iter()
                .map(|d| format!("{}: {}", d.field(), d.msg))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => format!("HTTP {status}"),
        };

        match status {
            422 => PolarError::Validation { message, details },
            400 if !details.is_empty() => PolarError::Validation { message, details },
            401 | 403 => PolarError::Unauthorized { status, message },
            404 => PolarError::NotFound { message },
            429 => PolarError::RateLimited {
                message,
                retry_after,
            },
            500..=599 => PolarError::Server { status, message },
            _ => PolarError::Api {
                status,
                error,
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PolarError::Validation { .. } => ErrorKind::Validation,
            PolarError::Unauthorized { .. } => ErrorKind::Auth,
            PolarError::NotFound { .. } => ErrorKind::NotFound,
            PolarError::RateLimited { .. } => ErrorKind::RateLimit,
            PolarError::Server { .. } => ErrorKind::Server,
            PolarError::Timeout(_) | PolarError::Http(HttpError::Reqwest(_)) => ErrorKind::Network,
            PolarError::Http(HttpError::Decode(_)) | PolarError::Json(_) => ErrorKind::Decode,
            PolarError::Api { .. } => ErrorKind::Api,
            PolarError::Config(_) => ErrorKind::Config,
            PolarError::Signature(_) => ErrorKind::Signature,
        }
    }

    /// HTTP status of the failed response, when there was one.
    ///
    /// Validation errors report `None` since they may originate client-side.
    pub fn status(&self) -> Option<u16> {
        match self {
            PolarError::Unauthorized { status, .. }
            | PolarError::Server { status, .. }
            | PolarError::Api { status, .. } => Some(*status),
            PolarError::NotFound { .. } => Some(404),
            PolarError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether a retry of the same request may succeed.
    ///
    /// This is the single retry classification used by the transport.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Server | ErrorKind::RateLimit
        )
    }

    /// Server-provided delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PolarError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
