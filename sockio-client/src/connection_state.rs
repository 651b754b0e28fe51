//! Connection state
//!
//! # Connection States
//!
//! - **Disconnected**: Initial state, or after a drop with reconnection disabled
//! - **Connected**: Pumps are servicing a live connection
//! - **Reconnecting**: Connection lost, the supervisor is redialing
//! - **Closed**: `close` was called; terminal
//!
//! # State Transitions
//!
//! ```text
//!                 dial ok
//! Disconnected ───────────► Connected ◄──────────┐
//!      ▲                     │     │              │ redial ok
//!      │ drop (no policy)    │     │ drop         │
//!      └─────────────────────┘     ▼              │
//!                            Reconnecting ────────┘
//!
//! any state ── close ──► Closed
//! ```

/// Lifecycle state of a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Connected and servicing the connection
    Connected,
    /// Redialing after an unexpected disconnect
    Reconnecting {
        /// Number of redial attempts started since the disconnect
        attempt: u32,
    },
    /// Closed by the caller
    Closed,
}

impl ConnectionState {
    /// True only while a connection is being serviced
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True once the client was closed
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }

    /// Numeric code recorded by the connection state gauge
    pub fn metric_code(&self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Reconnecting { .. } => 2,
            ConnectionState::Closed => 3,
        }
    }
}
