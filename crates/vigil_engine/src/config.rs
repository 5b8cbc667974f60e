//! Configuration for the client and its resolution engine.

use std::time::Duration;

/// Configuration for a monitoring client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URL, e.g. `https://monitor.example.com`.
    pub server_url: String,
    /// Retry behavior while waiting for created objects to appear.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// How long to keep looking for a created object.
///
/// The server applies creation commands asynchronously, so the first
/// listing after a command frequently does not show the new object yet.
/// Observed retry counts are small; the defaults leave a wide margin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of "after" listings per resolution. Zero is treated
    /// as one.
    pub max_attempts: u32,
    /// Fixed delay between listings.
    pub delay: Duration,
}

impl RetryConfig {
    /// Default attempt budget.
    pub const DEFAULT_ATTEMPTS: u32 = 10;

    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Creates a configuration with the given attempt budget and the
    /// default delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Creates a configuration that looks exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Creates a configuration that retries without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    /// Sets the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Effective attempt budget.
    pub fn budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the given attempt (0-indexed). The first attempt runs
    /// immediately.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}
