//! Tunables for the ordering service and its stores.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and timeout settings for ordering operations.
///
/// Deserializes from the host application's configuration; missing fields
/// take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Attempts per operation, the first included. `1` surfaces every
    /// conflict to the caller.
    pub max_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n` times this long.
    pub retry_backoff_ms: u64,
    /// Upper bound on how long a store transaction may wait for its locks.
    /// Zero is treated as one millisecond.
    pub transaction_timeout_ms: u64,
}

impl OrderingConfig {
    const DEFAULT_MAX_ATTEMPTS: u32 = 1;
    const DEFAULT_RETRY_BACKOFF_MS: u64 = 25;
    const DEFAULT_TRANSACTION_TIMEOUT_MS: u64 = 5_000;

    /// Sets the number of attempts per operation. Zero is treated as one.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base backoff between attempts.
    #[must_use]
    pub const fn with_retry_backoff_ms(mut self, millis: u64) -> Self {
        self.retry_backoff_ms = millis;
        self
    }

    /// Sets the transaction timeout.
    #[must_use]
    pub const fn with_transaction_timeout_ms(mut self, millis: u64) -> Self {
        self.transaction_timeout_ms = millis;
        self
    }

    /// Returns the attempt budget, never less than one.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Returns the delay to wait after the given failed attempt.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Returns the transaction timeout as a [`Duration`], never less than
    /// one millisecond.
    #[must_use]
    pub const fn transaction_timeout(&self) -> Duration {
        if self.transaction_timeout_ms == 0 {
            Duration::from_millis(1)
        } else {
            Duration::from_millis(self.transaction_timeout_ms)
        }
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: Self::DEFAULT_RETRY_BACKOFF_MS,
            transaction_timeout_ms: Self::DEFAULT_TRANSACTION_TIMEOUT_MS,
        }
    }
}
