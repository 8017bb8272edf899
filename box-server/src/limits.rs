//! Rate limiting for dots-server.
//!
//! Every connection gets its own message quota, keyed by the connection id
//! handed out by the coordinator. A server-wide limiter caps aggregate
//! throughput on top of that.
//!
//! Both use the governor crate; the keyed limiter is backed by DashMap.

use crate::config::LimitsConfig;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Type alias for a keyed rate limiter using DashMap.
type KeyedLimiter<K> = RateLimiter<
    K,
    dashmap::DashMap<K, InMemoryState>,
    DefaultClock,
    NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// Type alias for a direct (non-keyed) rate limiter.
type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiters for the coordinator.
#[derive(Clone)]
pub struct RateLimits {
    /// Limits messages per connection.
    ///
    /// Configured via `limits.messages_per_minute`.
    message_limiter: Arc<KeyedLimiter<u64>>,

    /// Limits messages across all connections.
    ///
    /// Configured via `limits.global_messages_per_second`.
    global_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for RateLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimits")
            .field("message_limiter", &"KeyedLimiter<u64>")
            .field("global_limiter", &"DirectLimiter")
            .finish()
    }
}

impl RateLimits {
    /// Create rate limiters from configuration.
    ///
    /// Zero quotas are treated as one; [`Config::validate`] rejects them
    /// before this point.
    ///
    /// [`Config::validate`]: crate::config::Config::validate
    pub fn new(config: &LimitsConfig) -> Self {
        let per_minute = NonZeroU32::new(config.messages_per_minute).unwrap_or(NonZeroU32::MIN);
        let per_second =
            NonZeroU32::new(config.global_messages_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            message_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            global_limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }

    /// Check if a message from `connection` is allowed.
    ///
    /// The global quota is checked first.
    pub fn check_message(&self, connection: u64) -> Result<(), RateLimitError> {
        self.global_limiter
            .check()
            .map_err(|_| RateLimitError::GlobalLimitExceeded)?;
        self.message_limiter
            .check_key(&connection)
            .map_err(|_| RateLimitError::MessageLimitExceeded)
    }

    /// Get the number of tracked connection keys (for metrics).
    pub fn message_keys_count(&self) -> usize {
        self.message_limiter.len()
    }

    /// Evict entries for connections whose quota has fully recharged.
    ///
    /// Call periodically from the cleanup task.
    pub fn shrink(&self) {
        self.message_limiter.retain_recent();
    }
}

/// Rate limit error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// Too many messages from this connection.
    #[error("message rate limit exceeded")]
    MessageLimitExceeded,
    /// Too many messages across all connections.
    #[error("global rate limit exceeded")]
    GlobalLimitExceeded,
}
