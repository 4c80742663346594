//! Error types for the Books API harness.
//!
//! # Design
//! Only transport failures are exceptional: `ApiError` is what client calls
//! return when no HTTP response could be obtained. Non-2xx statuses are
//! ordinary `HttpResponse` values so test cases can assert on them. The other
//! enums cover configuration, fixture persistence, schema compilation and
//! assertion failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpMethod;

/// Errors returned by `ApiClient` and `BooksClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response arrived within the configured request timeout.
    #[error("{method} {url} timed out")]
    Timeout { method: HttpMethod, url: String },

    /// The connection could not be established (refused, DNS, reset).
    #[error("{method} {url} connection failed: {message}")]
    Connection {
        method: HttpMethod,
        url: String,
        message: String,
    },

    /// Any other transport-level failure.
    #[error("{method} {url} failed: {message}")]
    Request {
        method: HttpMethod,
        url: String,
        message: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    /// Whether the failure happened on the wire.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout { .. } | ApiError::Connection { .. } | ApiError::Request { .. }
        )
    }

    /// Whether the failure is transient: a timeout or a failed connection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Connection { .. })
    }
}

/// A malformed setting found by `Config::validate`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("Invalid API_BASE_URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Timeouts must be positive values ({name}={value})")]
    NonPositiveTimeout { name: &'static str, value: i64 },

    #[error("Retry settings must be non-negative ({name}={value})")]
    NegativeRetrySetting { name: &'static str, value: i64 },

    #[error("Invalid LOG_LEVEL: {0}")]
    InvalidLogLevel(String),
}

/// Errors reading or writing the fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture file '{path}' is not a valid bundle: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A built-in JSON schema failed to compile.
#[derive(Debug, Error)]
#[error("invalid JSON schema '{name}': {message}")]
pub struct SchemaError {
    pub name: &'static str,
    pub message: String,
}

/// A failed check from `crate::assertions`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AssertionError(pub String);

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
