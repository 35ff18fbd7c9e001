//! Endpoint configuration types.

use std::net::SocketAddr;
use std::time::Duration;

/// Default cap on a single local message in bytes.
pub const DEFAULT_MAX_LOCAL_MESSAGE_SIZE: usize = 32 * 1024;

/// Initial delay between reconnect attempts.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on the reconnect delay.
pub const MAX_CONNECT_TIMEOUT: Duration = Duration::from_millis(1600);

/// Deadline on a single outstanding connect attempt.
pub const DEFAULT_CONNECTING_TIMEOUT: Duration = Duration::from_millis(500);

/// Backoff strategy for reconnection attempts.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// Fixed delay between attempts.
    Fixed(Duration),
    /// Exponential backoff with configurable parameters.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier for each attempt.
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(d) => *d,
            BackoffStrategy::Exponential {
                base,
                max,
                multiplier,
            } => {
                let delay_ms = base.as_millis() as f64 * multiplier.powi(attempt as i32);
                Duration::from_millis(delay_ms.min(max.as_millis() as f64) as u64)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential {
            base: DEFAULT_CONNECT_TIMEOUT,
            max: MAX_CONNECT_TIMEOUT,
            multiplier: 2.0,
        }
    }
}

/// Retry policy for reconnection attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of reconnect attempts. `None` for unlimited.
    pub max_reconnects: Option<u32>,
    /// Backoff strategy between attempts.
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl RetryPolicy {
    /// Create a policy with unlimited reconnects (the local endpoint
    /// default).
    pub fn unlimited() -> Self {
        Self {
            max_reconnects: None,
            backoff: BackoffStrategy::default(),
        }
    }

    /// Create a policy with a finite reconnect budget.
    pub fn limited(max_reconnects: u32) -> Self {
        Self {
            max_reconnects: Some(max_reconnects),
            backoff: BackoffStrategy::default(),
        }
    }

    /// Create a policy with fixed-delay reconnects.
    pub fn fixed(max_reconnects: u32, delay: Duration) -> Self {
        Self {
            max_reconnects: Some(max_reconnects),
            backoff: BackoffStrategy::Fixed(delay),
        }
    }

    /// Check if another reconnect attempt should be made.
    pub fn should_retry(&self, attempt: u32) -> bool {
        match self.max_reconnects {
            Some(max) => attempt < max,
            None => true,
        }
    }

    /// Get the delay before the given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

/// Configuration of a local client endpoint, supplied at construction.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Local address to bind before connecting.
    pub local: SocketAddr,
    /// Address of the routing daemon.
    pub remote: SocketAddr,
    /// Cap on a single outbound message in bytes.
    pub max_message_size: usize,
    /// Cap on the queued outbound bytes; `None` for unlimited.
    pub queue_limit: Option<usize>,
    /// Reconnect policy.
    pub retry_policy: RetryPolicy,
    /// Deadline on a single outstanding connect attempt.
    pub connecting_timeout: Duration,
}

impl EndpointConfig {
    /// Create a configuration with the default limits.
    pub fn new(local: SocketAddr, remote: SocketAddr) -> Self {
        Self {
            local,
            remote,
            max_message_size: DEFAULT_MAX_LOCAL_MESSAGE_SIZE,
            queue_limit: None,
            retry_policy: RetryPolicy::unlimited(),
            connecting_timeout: DEFAULT_CONNECTING_TIMEOUT,
        }
    }

    /// Set the maximum message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the outbound queue limit in bytes.
    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = Some(limit);
        self
    }

    /// Set the reconnect policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the connect attempt deadline.
    pub fn with_connecting_timeout(mut self, timeout: Duration) -> Self {
        self.connecting_timeout = timeout;
        self
    }
}
