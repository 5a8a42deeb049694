//! Error types for the Shlink API client.
//!
//! # Design
//! A failed call lands in one of three tiers. `Transport` covers everything
//! that kept a response from arriving. `Http` carries Shlink's
//! problem-details payload untouched. The remaining remote variants are the
//! typed refinements produced by `translate` when the current operation
//! recognises the payload's `type` discriminator; each keeps the original
//! `HttpError` as its source so detail and status are never lost.

use serde_json::{Map, Value};

/// Payload keys that describe the failure itself. Everything else in a
/// problem-details body is operation context and goes to `additional`.
const PROBLEM_KEYS: [&str; 4] = ["type", "title", "detail", "status"];

/// A non-2xx response from Shlink, decoded from its problem-details body.
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("remote call failed with status {status}: {detail}")]
pub struct HttpError {
    status: u16,
    error_type: String,
    title: String,
    detail: String,
    additional: Map<String, Value>,
}

impl HttpError {
    /// Build from a decoded error payload. Missing or mistyped fields fall
    /// back to empty values; `status` falls back to the response status.
    pub fn from_payload(status: u16, payload: &Value) -> Self {
        let Some(fields) = payload.as_object() else {
            return Self {
                status,
                ..Self::default()
            };
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            status: fields
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(status),
            error_type: text("type"),
            title: text("title"),
            detail: text("detail"),
            additional: fields
                .iter()
                .filter(|(key, _)| !PROBLEM_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Machine-readable discriminator, e.g. `TAG_NOT_FOUND`.
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn additional(&self) -> &Map<String, Value> {
        &self.additional
    }
}

/// Errors returned by the transport and the resource clients.
#[derive(Debug, thiserror::Error)]
pub enum ShlinkError {
    /// No response was received (connection refused, timeout, TLS...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Shlink answered with an error this operation has no typed kind for.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("short URL not found: {}", .0.detail())]
    ShortUrlNotFound(#[source] HttpError),

    /// The short URL reached the visits threshold past which it can no
    /// longer be deleted.
    #[error("short URL cannot be deleted: {}", .source.detail())]
    DeleteShortUrlThreshold {
        threshold: Option<u64>,
        #[source]
        source: HttpError,
    },

    #[error("invalid data: {}", .0.detail())]
    InvalidData(#[source] HttpError),

    #[error("invalid long URL {long_url:?}: {}", .source.detail())]
    InvalidLongUrl {
        long_url: String,
        #[source]
        source: HttpError,
    },

    #[error("slug already in use: {}", .0.detail())]
    NonUniqueSlug(#[source] HttpError),

    #[error("forbidden tag operation: {}", .0.detail())]
    ForbiddenTagOperation(#[source] HttpError),

    #[error("tag not found: {}", .0.detail())]
    TagNotFound(#[source] HttpError),

    #[error("tag conflict: {}", .0.detail())]
    TagConflict(#[source] HttpError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ShlinkError {
    /// `INVALID_URL` carries the rejected URL under `additional.url`.
    pub(crate) fn invalid_long_url(source: HttpError) -> Self {
        let long_url = source
            .additional()
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self::InvalidLongUrl { long_url, source }
    }

    pub(crate) fn delete_threshold(source: HttpError) -> Self {
        let threshold = source.additional().get("threshold").and_then(Value::as_u64);
        Self::DeleteShortUrlThreshold { threshold, source }
    }

    /// The remote failure behind this error, typed or not.
    pub fn remote_failure(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e)
            | Self::ShortUrlNotFound(e)
            | Self::InvalidData(e)
            | Self::NonUniqueSlug(e)
            | Self::ForbiddenTagOperation(e)
            | Self::TagNotFound(e)
            | Self::TagConflict(e) => Some(e),
            Self::DeleteShortUrlThreshold { source, .. } | Self::InvalidLongUrl { source, .. } => {
                Some(source)
            }
            Self::Transport(_)
            | Self::Serialization(_)
            | Self::Deserialization(_)
            | Self::Config(_) => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        self.remote_failure().map(HttpError::detail)
    }

    pub fn status(&self) -> Option<u16> {
        self.remote_failure().map(HttpError::status)
    }

    /// The rejected long URL, for `InvalidLongUrl` errors.
    pub fn long_url(&self) -> Option<&str> {
        match self {
            Self::InvalidLongUrl { long_url, .. } => Some(long_url),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShlinkError>;
