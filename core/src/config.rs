//! Harness settings.
//!
//! # Design
//! `Config` is an ordinary value built once at startup and passed to the
//! client, generator and fixture store. Values come from the process
//! environment (after loading an optional `.env` file) with documented
//! defaults. Nothing here aborts: unparseable numbers fall back to the
//! default and `validate` only reports.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigIssue;

pub const DEFAULT_BASE_URL: &str = "https://fakerestapi.azurewebsites.net";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const VALID_LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub api_version: String,
    /// Per-request timeout in seconds.
    pub api_timeout: i64,
    /// Test-level timeout in seconds.
    pub test_timeout: i64,
    pub max_retries: i64,
    /// Backoff factor in seconds.
    pub retry_delay: i64,
    pub log_level: String,
    /// Upper bound for a single list call in the response-time test, seconds.
    pub performance_timeout: i64,
    pub max_response_size: u64,
    pub allow_insecure_requests: bool,
    pub test_data_dir: PathBuf,
    pub test_data_file: String,
    pub reports_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_timeout: 30,
            test_timeout: 60,
            max_retries: 3,
            retry_delay: 1,
            log_level: "INFO".to_string(),
            performance_timeout: 10,
            max_response_size: 1_048_576,
            allow_insecure_requests: false,
            test_data_dir: PathBuf::from("tests/test_data"),
            test_data_file: "test_books.json".to_string(),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl Config {
    /// Load settings from the environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        // A missing `.env` is the common case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_version: lookup("API_VERSION").unwrap_or(defaults.api_version),
            api_timeout: parse_or(&lookup, "TIMEOUT", defaults.api_timeout),
            test_timeout: parse_or(&lookup, "TEST_TIMEOUT", defaults.test_timeout),
            max_retries: parse_or(&lookup, "MAX_RETRIES", defaults.max_retries),
            retry_delay: parse_or(&lookup, "RETRY_DELAY", defaults.retry_delay),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            performance_timeout: parse_or(&lookup, "PERFORMANCE_TIMEOUT", defaults.performance_timeout),
            max_response_size: parse_or(&lookup, "MAX_RESPONSE_SIZE", defaults.max_response_size),
            allow_insecure_requests: lookup("ALLOW_INSECURE_REQUESTS")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.allow_insecure_requests),
            test_data_dir: lookup("TEST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.test_data_dir),
            test_data_file: defaults.test_data_file,
            reports_dir: lookup("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reports_dir),
        }
    }

    /// Same settings pointed at a different server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    /// `{base}/api/{version}/Books`
    pub fn books_endpoint(&self) -> String {
        format!(
            "{}/api/{}/Books",
            self.api_base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    pub fn book_by_id_endpoint(&self, book_id: i64) -> String {
        format!("{}/{book_id}", self.books_endpoint())
    }

    pub fn fixture_path(&self) -> PathBuf {
        self.test_data_dir.join(&self.test_data_file)
    }

    /// Request timeout; non-positive settings are clamped to one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.api_timeout).unwrap_or(0).max(1))
    }

    pub fn performance_budget(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.performance_timeout).unwrap_or(0).max(1))
    }

    /// Report the first malformed setting, if any.
    pub fn validate(&self) -> Result<(), ConfigIssue> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigIssue::InvalidBaseUrl(self.api_base_url.clone()));
        }
        for (name, value) in [("TIMEOUT", self.api_timeout), ("TEST_TIMEOUT", self.test_timeout)] {
            if value <= 0 {
                return Err(ConfigIssue::NonPositiveTimeout { name, value });
            }
        }
        for (name, value) in [("MAX_RETRIES", self.max_retries), ("RETRY_DELAY", self.retry_delay)] {
            if value < 0 {
                return Err(ConfigIssue::NegativeRetrySetting { name, value });
            }
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigIssue::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Log a warning when validation fails. Returns whether the config is valid.
    pub fn warn_if_invalid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(issue) => {
                warn!(%issue, "Configuration validation failed. Please check your settings.");
                false
            }
        }
    }

    /// `tracing` filter directive for the configured log level.
    pub fn tracing_directive(&self) -> &'static str {
        match self.log_level.as_str() {
            "DEBUG" => "debug",
            "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "unparseable setting, using default");
            default
        }),
    }
}
