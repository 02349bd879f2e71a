//! Idempotent retry with server-driven backoff.
//!
//! Requests that fail with a transient status are retried up to the
//! configured attempt budget. The wait between attempts honors the
//! server's own hints: an `X-Retry-In` duration string takes precedence
//! over `Retry-After` (delta-seconds or an HTTP-date), with a fixed
//! fallback when neither is present.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Method;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::enrich::PreparedRequest;
use crate::error::HttpError;
use crate::transport::{RawResponse, Transport};

// ============================================================================
// Policy
// ============================================================================

/// Statuses that signal a transient condition worth retrying.
pub const RETRYABLE_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

/// Fallback wait when the server offers no backoff hint.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// How many attempts to make and how long each may take.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first request.
    pub max_attempts: u32,
    /// Per-attempt deadline; `None` waits indefinitely.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Builds a policy from a retry count (attempts beyond the first).
    pub fn new(retries: u32, attempt_timeout: Option<Duration>) -> Self {
        Self {
            max_attempts: retries + 1,
            attempt_timeout,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, None)
    }
}

// ============================================================================
// Sleeper
// ============================================================================

/// Abstraction over the inter-attempt wait, so tests run instantly.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Backoff Hints
// ============================================================================

fn duration_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)(\d+)(ms|s|m|h)").ok())
        .as_ref()
}

/// Parses a compound duration string like `1500ms`, `2s`, or `1m30s`.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let mut matched = 0;
    for caps in duration_pattern()?.captures_iter(input) {
        let value: u64 = caps[1].parse().ok()?;
        let millis = match caps[2].to_ascii_lowercase().as_str() {
            "ms" => value,
            "s" => value * 1_000,
            "m" => value * 60_000,
            "h" => value * 3_600_000,
            _ => return None,
        };
        total += Duration::from_millis(millis);
        matched += caps[0].len();
    }
    if matched == 0 || matched != input.trim().len() {
        return None;
    }
    Some(total)
}

/// Parses a `Retry-After` value: delta-seconds or an HTTP-date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let when = DateTime::parse_from_rfc2822(value.trim()).ok()?;
    (when.with_timezone(&Utc) - now).to_std().ok()
}

/// Resolves the wait before the next attempt from the response headers.
pub fn backoff_hint(response: &RawResponse, now: DateTime<Utc>) -> Duration {
    if let Some(hint) = response.header("x-retry-in").and_then(parse_duration) {
        return hint;
    }
    if let Some(hint) = response
        .header("retry-after")
        .and_then(|v| parse_retry_after(v, now))
    {
        return hint;
    }
    DEFAULT_BACKOFF
}

// ============================================================================
// Executor
// ============================================================================

/// Drives a prepared request through the transport under a retry policy.
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl RetryExecutor {
    /// Creates an executor with the production sleeper.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Box::new(TokioSleeper),
        }
    }

    /// Replaces the sleeper (used by tests).
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Executes the request, retrying transient failures.
    ///
    /// Only GET, HEAD, PUT, and DELETE are retried; other methods are not
    /// safely repeatable and get exactly one attempt. A timeout on the
    /// final attempt surfaces as [`HttpError::Timeout`]; earlier timeouts
    /// back off like any other transient failure and the loop continues.
    pub async fn execute(
        &self,
        transport: &Transport,
        request: &PreparedRequest,
    ) -> Result<RawResponse, HttpError> {
        let max_attempts = if is_idempotent(&request.method) {
            self.policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let last = attempt >= max_attempts;

            let outcome = match self.policy.attempt_timeout {
                Some(deadline) => {
                    match tokio::time::timeout(deadline, transport.round_trip(request)).await {
                        Ok(result) => result,
                        Err(_) if last => return Err(HttpError::Timeout(deadline)),
                        Err(_) => {
                            warn!(attempt, ?deadline, "Attempt timed out; backing off");
                            self.sleeper.sleep(DEFAULT_BACKOFF).await;
                            continue;
                        }
                    }
                }
                None => transport.round_trip(request).await,
            };

            match outcome {
                Ok(response) if !last && RETRYABLE_STATUSES.contains(&response.status) => {
                    let wait = backoff_hint(&response, Utc::now());
                    debug!(
                        attempt,
                        status = response.status,
                        wait_ms = wait.as_millis() as u64,
                        "Transient status; backing off"
                    );
                    self.sleeper.sleep(wait).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if !last && e.is_transient() => {
                    warn!(attempt, error = %e, "Transient transport error; retrying");
                    self.sleeper.sleep(DEFAULT_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Whether a method is safe to repeat after an ambiguous failure.
fn is_idempotent(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
    .contains(method)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn response_with(headers: &[(&str, &str)]) -> RawResponse {
        RawResponse {
            proto: "HTTP/1.1".to_string(),
            status: 503,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            body: Vec::new(),
            from_cache: false,
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("1500ms"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("5 parsecs"), None);
    }

    #[test]
    fn test_retry_in_takes_precedence() {
        let response = response_with(&[("x-retry-in", "250ms"), ("retry-after", "30")]);
        assert_eq!(
            backoff_hint(&response, Utc::now()),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_retry_after_seconds() {
        let response = response_with(&[("retry-after", "7")]);
        assert_eq!(backoff_hint(&response, Utc::now()), Duration::from_secs(7));
    }

    #[test]
    fn test_retry_after_http_date() {
        let now = Utc::now();
        let later = (now + chrono::Duration::seconds(120)).to_rfc2822();
        let response = response_with(&[("retry-after", later.as_str())]);
        let wait = backoff_hint(&response, now);
        assert!(wait >= Duration::from_secs(118) && wait <= Duration::from_secs(121));
    }

    #[test]
    fn test_default_backoff_without_hints() {
        let response = response_with(&[]);
        assert_eq!(backoff_hint(&response, Utc::now()), DEFAULT_BACKOFF);
    }

    #[test]
    fn test_idempotent_methods() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::PUT));
        assert!(is_idempotent(&Method::DELETE));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PATCH));
    }
}
