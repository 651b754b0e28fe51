//! Engine.IO v3 / Socket.IO packet types
//!
//! A Socket.IO client over websocket exchanges text frames. Each frame is
//! one Engine.IO packet whose first character is the Engine.IO type digit.
//! Engine.IO `message` packets (`4`) carry a Socket.IO packet, whose type is
//! the second digit:
//!
//! ```text
//! 0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":5000}   open
//! 2                                                                       ping
//! 3                                                                       pong
//! 40                                                                      connect
//! 42["chat","hello"]                                                      event
//! 4217["chat","hello"]                                                    event, ack id 17
//! 4317["ok"]                                                              ack for id 17
//! ```
//!
//! [`Packet`] models both layers as a single enum since the client never
//! needs to look at an Engine.IO message without its Socket.IO payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Engine.IO packet type digits
pub mod engine {
    /// Session handshake sent by the server
    pub const OPEN: char = '0';
    /// Transport close
    pub const CLOSE: char = '1';
    /// Heartbeat probe
    pub const PING: char = '2';
    /// Heartbeat reply
    pub const PONG: char = '3';
    /// Wrapper for a Socket.IO packet
    pub const MESSAGE: char = '4';
    /// Transport upgrade
    pub const UPGRADE: char = '5';
    /// No-op
    pub const NOOP: char = '6';
}

/// Socket.IO packet type digits (inside an Engine.IO message)
pub mod socket {
    /// Namespace connected
    pub const CONNECT: char = '0';
    /// Namespace disconnected
    pub const DISCONNECT: char = '1';
    /// Named event
    pub const EVENT: char = '2';
    /// Acknowledgement of an event
    pub const ACK: char = '3';
    /// Server-side error
    pub const ERROR: char = '4';
}

/// Session parameters sent by the server in the `open` packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Session id assigned by the server
    pub sid: String,
    /// Transports the session may upgrade to
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// How often the client must ping, in milliseconds
    pub ping_interval: u64,
    /// How long the server waits for a ping before dropping the session, in milliseconds
    pub ping_timeout: u64,
}

impl Handshake {
    /// Ping interval as a `Duration`
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval)
    }

    /// Ping timeout as a `Duration`
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout)
    }
}

/// A decoded Engine.IO / Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO open with the session handshake
    Open(Handshake),
    /// Engine.IO close
    Close,
    /// Engine.IO ping
    Ping,
    /// Engine.IO pong
    Pong,
    /// Engine.IO upgrade
    Upgrade,
    /// Engine.IO noop
    Noop,
    /// Socket.IO connect for the default namespace
    Connect,
    /// Socket.IO disconnect for the default namespace
    Disconnect,
    /// Socket.IO event
    Event {
        /// Event name
        name: String,
        /// Event arguments, in order
        args: Vec<Value>,
        /// Set when the sender expects an acknowledgement
        ack_id: Option<u64>,
    },
    /// Socket.IO acknowledgement
    Ack {
        /// Id of the event being acknowledged
        id: u64,
        /// Acknowledgement arguments
        args: Vec<Value>,
    },
    /// Socket.IO error
    Error(String),
}

impl Packet {
    /// Create an event packet without an ack id
    pub fn event(name: impl Into<String>, args: Vec<Value>) -> Self {
        Packet::Event {
            name: name.into(),
            args,
            ack_id: None,
        }
    }

    /// Short name of the packet kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Open(_) => "open",
            Packet::Close => "close",
            Packet::Ping => "ping",
            Packet::Pong => "pong",
            Packet::Upgrade => "upgrade",
            Packet::Noop => "noop",
            Packet::Connect => "connect",
            Packet::Disconnect => "disconnect",
            Packet::Event { .. } => "event",
            Packet::Ack { .. } => "ack",
            Packet::Error(_) => "error",
        }
    }
}
