use std::str::FromStr;
use std::time::Duration;

use a11y_core::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use a11y_core::types::DEFAULT_STANDARD;

/// Reporting API used when `A11Y_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.seoa11y.com";

/// Worker endpoint used when `A11Y_WORKER_URL` is unset.
pub const DEFAULT_WORKER_URL: &str = "http://worker.seoa11y.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Dispatch configuration loaded from environment variables.
///
/// All fields have defaults matching the hosted service. The binary
/// applies command-line overrides on top.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Reporting API base URL.
    pub api_url: String,
    /// Worker endpoint that audits one page per request.
    pub worker_url: String,
    /// Maximum number of URLs audited at once (at least 1).
    pub concurrency: usize,
    /// Accessibility standard recorded on new reports.
    pub standard: String,
    /// Retry strategy for failed worker calls.
    pub retry: RetryPolicy,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Stop pulling new URLs as soon as any failure is recorded.
    pub cancel_on_failure: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            worker_url: DEFAULT_WORKER_URL.to_string(),
            concurrency: 1,
            standard: DEFAULT_STANDARD.to_string(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(30),
            cancel_on_failure: false,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                     |
    /// |-----------------------------|-----------------------------|
    /// | `A11Y_API_URL`              | `https://api.seoa11y.com`   |
    /// | `A11Y_WORKER_URL`           | `http://worker.seoa11y.com` |
    /// | `A11Y_CONCURRENCY`          | `1`                         |
    /// | `A11Y_STANDARD`             | `WCAG2AA`                   |
    /// | `A11Y_MAX_ATTEMPTS`         | `5` (`0` retries forever)   |
    /// | `A11Y_RETRY_DELAY_MS`       | `1000`                      |
    /// | `A11Y_RETRY_MAX_DELAY_MS`   | `30000`                     |
    /// | `A11Y_REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `A11Y_CANCEL_ON_FAILURE`    | `false`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let max_attempts = match parse_var(&lookup, "A11Y_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)? {
            0 => None,
            n => Some(n),
        };
        let retry = RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(parse_var(&lookup, "A11Y_RETRY_DELAY_MS", 1000)?),
            max_delay: Duration::from_millis(parse_var(
                &lookup,
                "A11Y_RETRY_MAX_DELAY_MS",
                30_000,
            )?),
            ..defaults.retry
        };

        let concurrency: usize = parse_var(&lookup, "A11Y_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "A11Y_CONCURRENCY",
                value: "0".into(),
            });
        }

        Ok(Self {
            api_url: lookup("A11Y_API_URL").unwrap_or(defaults.api_url),
            worker_url: lookup("A11Y_WORKER_URL").unwrap_or(defaults.worker_url),
            concurrency,
            standard: lookup("A11Y_STANDARD").unwrap_or(defaults.standard),
            retry,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "A11Y_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            cancel_on_failure: parse_var(&lookup, "A11Y_CANCEL_ON_FAILURE", false)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
