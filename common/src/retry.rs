// Retry strategy with exponential backoff and jitter
//
// Used by the market client: the exchange API drops requests routinely, so
// every fetch gets a bounded number of attempts before the caller gives up.

use rand::Rng;
use std::time::Duration;

/// Retry strategy trait for calculating retry delays
pub trait RetryStrategy: Send + Sync {
    /// Delay before the next retry attempt, or None when attempts are spent
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Check if more retries are allowed
    fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries()
    }

    /// Total number of attempts allowed
    fn max_retries(&self) -> u32;
}

/// Exponential backoff with jitter
///
/// Sequence with the default base of 1s: 1s, 2s, 4s, 8s, ... capped at
/// `max_delay_secs`, plus up to `jitter_factor` random extra.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay_secs: u64,
    max_delay_secs: u64,
    jitter_factor: f64,
    max_retries: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay_secs: 1,
            max_delay_secs: 30,
            jitter_factor: 0.5,
            max_retries: 5,
        }
    }
}

impl ExponentialBackoff {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_config(
        base_delay_secs: u64,
        max_delay_secs: u64,
        jitter_factor: f64,
        max_retries: u32,
    ) -> Self {
        Self {
            base_delay_secs,
            max_delay_secs,
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            max_retries,
        }
    }

    fn calculate_base_delay(&self, attempt: u32) -> u64 {
        let delay = self
            .base_delay_secs
            .saturating_mul(2_u64.saturating_pow(attempt));
        delay.min(self.max_delay_secs)
    }

    fn add_jitter_ms(&self, base_delay_secs: u64) -> u64 {
        let base_delay_ms = base_delay_secs * 1000;
        if self.jitter_factor == 0.0 {
            return base_delay_ms;
        }

        let jitter_range_ms = (base_delay_ms as f64 * self.jitter_factor) as u64;
        let jitter_ms = if jitter_range_ms > 0 {
            rand::thread_rng().gen_range(0..=jitter_range_ms)
        } else {
            0
        };

        base_delay_ms + jitter_ms
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let base_delay_secs = self.calculate_base_delay(attempt);
        Some(Duration::from_millis(self.add_jitter_ms(base_delay_secs)))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Fixed delay retry strategy (for tests and local development)
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_retries: u32,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        Some(self.delay)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
