//! sockio - Socket.IO v2 client over a persistent transport
//!
//! This is the main convenience crate that re-exports the sockio sub-crates.
//! Use this crate if you want a single dependency.
//!
//! # Architecture
//!
//! sockio is organized into modular crates:
//!
//! - **sockio-core**: Packet types, codec, URL builder, error handling, observability
//! - **sockio-client**: Client lifecycle, channel pumps, reconnection supervisor
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sockio::{get_url, ClientBuilder};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::websocket()
//!         .enable_reconnection()
//!         .on("news", |args| async move {
//!             println!("news: {:?}", args);
//!         })
//!         .build_to_connect(get_url("localhost", 3000, false, &HashMap::new()));
//!
//!     client.dial().await?;
//!     client.emit("subscribe", vec![serde_json::json!("sports")]).await?;
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub use sockio_client as client;
pub use sockio_core as core;

// Convenience re-exports of the most commonly used types
pub use sockio_client::{Client, ClientBuilder, ConnectionState, ReconnectionPolicy};
pub use sockio_core::{get_url, Error, ObservabilityConfig, Result};
