//! Mailbox configuration with sensible defaults.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default total capacity when prioritization is disabled
pub const DEFAULT_MAILBOX_SIZE: usize = 1000;

/// Default per-bucket capacity when prioritization is enabled
pub const DEFAULT_PRIORITY_QUEUE_SIZE: usize = 100;

/// Default time an `offer` waits for space before failing
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default consecutive dequeues from one bucket before a lower bucket is serviced
pub const DEFAULT_ANTI_STARVATION_LIMIT: u32 = 16;

/// Default bounded capacity of each subscriber channel
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 100;

/// Configuration for a [`PriorityMailbox`](super::PriorityMailbox).
///
/// # Examples
///
/// ```rust
/// use agentsys_rt::mailbox::{MailboxConfig, DEFAULT_MAILBOX_SIZE};
/// use std::time::Duration;
///
/// // Defaults
/// let config = MailboxConfig::default();
/// assert_eq!(config.size, DEFAULT_MAILBOX_SIZE);
///
/// // Builder for custom configuration
/// let config = MailboxConfig::builder()
///     .with_priority_queue_size(32)
///     .with_backpressure_timeout(Duration::from_millis(50))
///     .build()
///     .unwrap();
/// assert_eq!(config.priority_queue_size, 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxConfig {
    /// Total capacity used when prioritization is disabled
    pub size: usize,

    /// Whether activities are bucketed by priority
    pub enable_prioritization: bool,

    /// Per-bucket capacity when prioritization is enabled
    pub priority_queue_size: usize,

    /// How long an `offer` waits for space before failing with `Full`
    pub backpressure_timeout: Duration,

    /// Consecutive dequeues from one bucket before servicing a lower bucket
    pub anti_starvation_limit: u32,

    /// Bounded capacity of each subscriber channel
    pub subscriber_capacity: usize,

    /// How long a broadcast waits on a slow subscriber before dropping it;
    /// defaults to `backpressure_timeout` when unset
    pub subscriber_timeout: Option<Duration>,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_MAILBOX_SIZE,
            enable_prioritization: true,
            priority_queue_size: DEFAULT_PRIORITY_QUEUE_SIZE,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
            anti_starvation_limit: DEFAULT_ANTI_STARVATION_LIMIT,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            subscriber_timeout: None,
        }
    }
}

impl MailboxConfig {
    /// Create a new configuration builder.
    pub fn builder() -> MailboxConfigBuilder {
        MailboxConfigBuilder::default()
    }

    /// Effective capacity of a single bucket.
    pub fn bucket_capacity(&self) -> usize {
        if self.enable_prioritization {
            self.priority_queue_size
        } else {
            self.size
        }
    }

    /// Effective timeout applied to slow subscribers.
    pub fn effective_subscriber_timeout(&self) -> Duration {
        self.subscriber_timeout.unwrap_or(self.backpressure_timeout)
    }

    /// Validate configuration values.
    ///
    /// Returns `Err` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.size == 0 {
            return Err("size must be > 0".to_string());
        }
        if self.priority_queue_size == 0 {
            return Err("priority_queue_size must be > 0".to_string());
        }
        if self.backpressure_timeout.is_zero() {
            return Err("backpressure_timeout must be > 0".to_string());
        }
        if self.anti_starvation_limit == 0 {
            return Err("anti_starvation_limit must be > 0".to_string());
        }
        if self.subscriber_capacity == 0 {
            return Err("subscriber_capacity must be > 0".to_string());
        }
        Ok(())
    }
}

/// Builder for [`MailboxConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct MailboxConfigBuilder {
    config: MailboxConfig,
}

impl MailboxConfigBuilder {
    /// Set the total capacity used when prioritization is disabled.
    pub fn with_size(mut self, size: usize) -> Self {
        self.config.size = size;
        self
    }

    /// Enable or disable priority bucketing.
    pub fn with_prioritization(mut self, enabled: bool) -> Self {
        self.config.enable_prioritization = enabled;
        self
    }

    /// Set the per-bucket capacity.
    pub fn with_priority_queue_size(mut self, size: usize) -> Self {
        self.config.priority_queue_size = size;
        self
    }

    /// Set the backpressure timeout applied to `offer`.
    pub fn with_backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.config.backpressure_timeout = timeout;
        self
    }

    /// Set the anti-starvation limit.
    pub fn with_anti_starvation_limit(mut self, limit: u32) -> Self {
        self.config.anti_starvation_limit = limit;
        self
    }

    /// Set the bounded capacity of subscriber channels.
    pub fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.config.subscriber_capacity = capacity;
        self
    }

    /// Set the timeout applied to slow subscribers.
    pub fn with_subscriber_timeout(mut self, timeout: Duration) -> Self {
        self.config.subscriber_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration.
    ///
    /// Returns `Err` if configuration is invalid.
    pub fn build(self) -> Result<MailboxConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
