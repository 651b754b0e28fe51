//! Error types for sockio
//!
//! This module defines the single error type shared by the codec, the
//! transports and the client lifecycle. Every fallible operation in the
//! workspace returns [`Result`], so callers can propagate with `?` and match
//! on the variant they care about.
//!
//! # Error Categories
//!
//! - **Transport errors**: WebSocket, ConnectionClosed, ConnectTimeout
//! - **Lifecycle errors**: AlreadyConnected, ClientClosed, OutboundQueueFull
//! - **Registration errors**: InvalidHandler
//! - **Codec errors**: Decode, Serialization
//!
//! # Examples
//!
//! ```rust
//! use sockio_core::Error;
//!
//! let error = Error::InvalidHandler {
//!     event: "".into(),
//!     reason: "event name must not be empty".into(),
//! };
//! assert!(error.to_string().contains("event name must not be empty"));
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type for sockio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for sockio operations
///
/// The enum is `Clone` so the same failure can be handed to a reconnection
/// error callback and logged without re-allocating the source.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// WebSocket transport layer error
    ///
    /// Covers failed handshakes, refused connections and frame errors
    /// reported by the underlying socket.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The connection is no longer usable
    #[error("Connection closed")]
    ConnectionClosed,

    /// Opening the transport took longer than the configured limit
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// `dial` was called while a connection is already being serviced
    #[error("Client is already connected")]
    AlreadyConnected,

    /// `dial` was called after `close`
    ///
    /// Closing a client is terminal. Build a new client to connect again.
    #[error("Client has been closed")]
    ClientClosed,

    /// An event handler could not be registered
    #[error("Invalid handler for event '{event}': {reason}")]
    InvalidHandler {
        /// The event name the handler was registered for
        event: String,
        /// Why the registration was rejected
        reason: String,
    },

    /// The outbound queue is full; the connection is down or too slow
    #[error("Outbound queue full")]
    OutboundQueueFull,

    /// An inbound frame is not a valid Engine.IO / Socket.IO packet
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for errors raised by the transport rather than by the
    /// caller or the codec.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::WebSocket(_) | Error::ConnectionClosed | Error::ConnectTimeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::WebSocket("refused".into()).to_string(),
            "WebSocket error: refused"
        );
        assert_eq!(Error::ConnectionClosed.to_string(), "Connection closed");
        assert_eq!(
            Error::AlreadyConnected.to_string(),
            "Client is already connected"
        );
        assert_eq!(Error::ClientClosed.to_string(), "Client has been closed");
    }

    #[test]
    fn test_invalid_handler_display() {
        let err = Error::InvalidHandler {
            event: "chat".into(),
            reason: "bad".into(),
        };
        assert_eq!(err.to_string(), "Invalid handler for event 'chat': bad");
    }

    #[test]
    fn test_connect_timeout_display() {
        let err = Error::ConnectTimeout(Duration::from_secs(2));
        assert_eq!(err.to_string(), "Connect timed out after 2s");
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::WebSocket("x".into()).is_transport());
        assert!(Error::ConnectionClosed.is_transport());
        assert!(Error::ConnectTimeout(Duration::from_millis(1)).is_transport());
        assert!(!Error::AlreadyConnected.is_transport());
        assert!(!Error::Decode("x".into()).is_transport());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::WebSocket("refused".into());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
