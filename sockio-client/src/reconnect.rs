//! Reconnection policy
//!
//! When the connection drops without the caller closing the client, the
//! reconnection supervisor sleeps for a fixed delay and dials again, forever,
//! until a dial succeeds. The policy decides:
//! - Whether reconnection happens at all
//! - How long to sleep before each attempt
//! - Who hears about failed attempts
//!
//! There is no backoff, jitter or attempt limit. Callers who want to give
//! up after a while can count failures in the error callback and close the
//! client from there.
//!
//! # Examples
//!
//! ```rust
//! use sockio_client::ReconnectionPolicy;
//! use std::time::Duration;
//!
//! let policy = ReconnectionPolicy::fixed(Duration::from_millis(500))
//!     .on_error(|err| eprintln!("reconnect failed: {}", err));
//! assert!(policy.enable);
//! ```

use sockio_core::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Delay used when the policy's delay is zero
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Callback invoked with the error of every failed redial attempt
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Fixed-delay, unbounded reconnection policy
#[derive(Clone, Default)]
pub struct ReconnectionPolicy {
    /// Reconnect after unexpected disconnects
    pub enable: bool,
    /// Sleep before each redial attempt; zero means [`DEFAULT_RETRY_DELAY`]
    pub retry_delay: Duration,
    /// Receives each failed attempt's error
    pub on_error: Option<ErrorCallback>,
}

impl ReconnectionPolicy {
    /// A disabled policy
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An enabled policy retrying every `delay`
    pub fn fixed(delay: Duration) -> Self {
        Self {
            enable: true,
            retry_delay: delay,
            on_error: None,
        }
    }

    /// Set the error callback
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// The delay the supervisor actually sleeps
    pub fn effective_delay(&self) -> Duration {
        if self.retry_delay.is_zero() {
            DEFAULT_RETRY_DELAY
        } else {
            self.retry_delay
        }
    }

    pub(crate) fn report(&self, error: &Error) {
        if let Some(callback) = &self.on_error {
            callback(error);
        }
    }
}

impl fmt::Debug for ReconnectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectionPolicy")
            .field("enable", &self.enable)
            .field("retry_delay", &self.retry_delay)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
