//! Retry and exponential backoff policy.
//!
//! The client consults the policy after every attempt: a transient status or
//! a transport failure on an allowed method is retried until `max_retries`
//! extra attempts have been made.

use std::time::Duration;

use crate::config::Config;
use crate::http::{HttpMethod, HttpResponse};

pub const DEFAULT_STATUS_FORCELIST: [u16; 5] = [429, 500, 502, 503, 504];
pub const DEFAULT_ALLOWED_METHODS: [HttpMethod; 6] = [
    HttpMethod::Head,
    HttpMethod::Get,
    HttpMethod::Options,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
];
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub status_forcelist: Vec<u16>,
    pub allowed_methods: Vec<HttpMethod>,
    /// Delay before retry `n` is `backoff_factor * 2^(n-1)`.
    pub backoff_factor: Duration,
    pub backoff_max: Duration,
    /// Use a numeric `Retry-After` on 429/503 instead of the backoff schedule.
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            status_forcelist: DEFAULT_STATUS_FORCELIST.to_vec(),
            allowed_methods: DEFAULT_ALLOWED_METHODS.to_vec(),
            backoff_factor: Duration::from_secs(1),
            backoff_max: DEFAULT_BACKOFF_MAX,
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: u32::try_from(config.max_retries).unwrap_or(0),
            backoff_factor: Duration::from_secs(u64::try_from(config.retry_delay).unwrap_or(0)),
            ..Self::default()
        }
    }

    /// Retries immediately, for tests.
    pub fn no_delay(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_factor: Duration::ZERO,
            respect_retry_after: false,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::no_delay(0)
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn allows(&self, method: HttpMethod) -> bool {
        self.allowed_methods.contains(&method)
    }

    pub fn is_retryable_status(&self, method: HttpMethod, status: u16) -> bool {
        self.allows(method) && self.status_forcelist.contains(&status)
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor.is_zero() {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        self.backoff_factor
            .checked_mul(1u32 << exponent)
            .map_or(self.backoff_max, |delay| delay.min(self.backoff_max))
    }

    /// Delay before retrying after `response`, honoring `Retry-After`.
    pub fn delay_after(&self, retry: u32, response: Option<&HttpResponse>) -> Duration {
        if self.respect_retry_after {
            let hinted = response
                .filter(|r| r.status == 429 || r.status == 503)
                .and_then(|r| r.header("retry-after"))
                .and_then(|v| v.trim().parse::<u64>().ok());
            if let Some(seconds) = hinted {
                return Duration::from_secs(seconds).min(self.backoff_max);
            }
        }
        self.backoff(retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_factor() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(10), DEFAULT_BACKOFF_MAX);
        assert_eq!(policy.backoff(40), DEFAULT_BACKOFF_MAX);
    }

    #[test]
    fn no_delay_policy_never_sleeps() {
        let policy = RetryPolicy::no_delay(5);
        assert_eq!(policy.backoff(3), Duration::ZERO);
        let response = HttpResponse::new(503, "").with_header("Retry-After", "30");
        assert_eq!(policy.delay_after(1, Some(&response)), Duration::ZERO);
        assert_eq!(policy.total_attempts(), 6);
    }

    #[test]
    fn retry_after_overrides_schedule() {
        let policy = RetryPolicy::default();
        let response = HttpResponse::new(429, "").with_header("Retry-After", "7");
        assert_eq!(policy.delay_after(1, Some(&response)), Duration::from_secs(7));
        let not_hinted = HttpResponse::new(500, "").with_header("Retry-After", "7");
        assert_eq!(policy.delay_after(1, Some(&not_hinted)), Duration::from_secs(1));
    }

    #[test]
    fn forcelist_and_methods_gate_status_retries() {
        let policy = RetryPolicy {
            allowed_methods: vec![HttpMethod::Get],
            ..RetryPolicy::default()
        };
        assert!(policy.is_retryable_status(HttpMethod::Get, 503));
        assert!(!policy.is_retryable_status(HttpMethod::Post, 503));
        assert!(!policy.is_retryable_status(HttpMethod::Get, 404));
    }

    #[test]
    fn from_config_clamps_negative_values() {
        let config = Config {
            max_retries: -2,
            retry_delay: -1,
            ..Config::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.backoff_factor, Duration::ZERO);
    }
}
