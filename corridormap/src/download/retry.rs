//! Retry policy for tile fetches.
//!
//! The policy is a pure function of the classified error and the attempt
//! counter, so the backoff schedule can be checked without any I/O.

use std::time::Duration;

use super::http::TransportError;

/// Default number of attempts per tile, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default client-side delay before every request (250ms).
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 250;

/// Backoff step for rate-limited responses; attempt `n` waits `(n + 1) * step`.
pub const DEFAULT_RATE_LIMIT_BACKOFF_SECS: u64 = 5;

/// Fixed wait after a network-level failure.
pub const DEFAULT_NETWORK_RETRY_SECS: u64 = 2;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `after`, then try again.
    Retry { after: Duration },
    /// Record the tile as failed.
    GiveUp,
}

/// Bounded retry with status-dependent backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Delay before each attempt.
    pub rate_limit_delay: Duration,
    /// Backoff unit for 403/429 responses.
    pub rate_limit_backoff_step: Duration,
    /// Delay after a network error.
    pub network_retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rate_limit_delay: Duration::from_millis(DEFAULT_RATE_LIMIT_DELAY_MS),
            rate_limit_backoff_step: Duration::from_secs(DEFAULT_RATE_LIMIT_BACKOFF_SECS),
            network_retry_delay: Duration::from_secs(DEFAULT_NETWORK_RETRY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Classifies a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `error` - The transport error from this attempt
    /// * `attempt` - Zero-based index of the attempt that just failed
    pub fn classify(&self, error: &TransportError, attempt: u32) -> RetryDecision {
        if let TransportError::Status(404) = error {
            return RetryDecision::GiveUp;
        }
        if attempt + 1 >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let after = match error {
            TransportError::Status(403) | TransportError::Status(429) => {
                self.rate_limit_backoff_step * (attempt + 1)
            }
            TransportError::Status(_) => Duration::ZERO,
            TransportError::Network(_) => self.network_retry_delay,
        };
        RetryDecision::Retry { after }
    }

    /// Returns true if the error indicates server-side rate limiting.
    pub fn is_rate_limited(error: &TransportError) -> bool {
        matches!(error, TransportError::Status(403) | TransportError::Status(429))
    }
}
