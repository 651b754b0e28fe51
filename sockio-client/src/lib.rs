//! Socket.IO client with connection lifecycle management
//!
//! This crate connects to a Socket.IO server over a persistent,
//! message-oriented transport, services the connection, and brings it back
//! on its own when it drops.
//!
//! # Core Features
//!
//! - **Two-phase setup**: build (register handlers) first, dial second
//! - **Pluggable transport**: anything implementing [`Transport`]; websocket by default
//! - **Auto-reconnection**: fixed-delay, unbounded redial after unexpected drops
//! - **Stable handlers**: registrations survive reconnects
//! - **Observability**: `tracing` logs and optional OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sockio_client::ClientBuilder;
//! use sockio_core::get_url;
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::websocket()
//!         .enable_reconnection()
//!         .with_reconnection_timeout(Duration::from_secs(2))
//!         .on("message", |args| async move {
//!             println!("message: {:?}", args);
//!         })
//!         .build_to_connect(get_url("localhost", 3000, false, &HashMap::new()));
//!
//!     client.dial().await?;
//!     client.emit("join", vec![serde_json::json!("lobby")]).await?;
//!
//!     // ...
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

mod channel;
mod client;
mod client_builder;
mod connection_state;
mod handler;
mod metrics;
mod reconnect;
mod supervisor;
mod transport;

pub use channel::{
    Channel, DisconnectCallback, HeartbeatConfig, SocketChannel, CONNECT_EVENT, DISCONNECT_EVENT,
    ERROR_EVENT,
};
pub use client::Client;
pub use client_builder::ClientBuilder;
pub use connection_state::ConnectionState;
pub use handler::{event_handler, EventHandler, HandlerRegistry};
pub use metrics::ClientMetrics;
pub use reconnect::{ErrorCallback, ReconnectionPolicy, DEFAULT_RETRY_DELAY};
pub use transport::{Connection, Transport, WebsocketConnection, WebsocketTransport};
