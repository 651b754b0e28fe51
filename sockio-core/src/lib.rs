//! Core Socket.IO types, codec and helpers for sockio
//!
//! This crate holds everything the client needs that does not involve a live
//! connection:
//!
//! - **Types**: Engine.IO v3 / Socket.IO packet model
//! - **Codec**: Encoding and decoding of websocket text frames
//! - **URL**: Building `ws://` / `wss://` Socket.IO endpoint addresses
//! - **Error handling**: The error type shared across the workspace
//! - **Observability**: tracing subscriber and OpenTelemetry bootstrap
//!
//! # Example
//!
//! ```rust
//! use sockio_core::{codec, get_url, Packet};
//! use std::collections::HashMap;
//!
//! let url = get_url("localhost", 3000, false, &HashMap::new());
//! assert!(url.starts_with("ws://localhost:3000/socket.io/"));
//!
//! let frame = codec::encode(&Packet::event("join", vec![serde_json::json!("lobby")])).unwrap();
//! assert_eq!(frame, r#"42["join","lobby"]"#);
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;
pub mod url;

pub use error::{Error, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Handshake, Packet};
pub use url::get_url;
