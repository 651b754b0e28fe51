//! Client builder
//!
//! The `ClientBuilder` collects everything a client needs before any socket
//! traffic is possible:
//! - The transport used to open connections
//! - The reconnection policy
//! - Event handler registrations
//! - Optional metrics
//!
//! Building and connecting are separate steps. `build_to_connect` returns a
//! client that is not connected yet; call [`Client::dial`] afterwards. All
//! handlers are therefore in place before the first inbound packet.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sockio_client::ClientBuilder;
//! use sockio_core::get_url;
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! # async fn example() -> sockio_core::Result<()> {
//! let url = get_url("localhost", 3000, false, &HashMap::new());
//! let client = ClientBuilder::websocket()
//!     .enable_reconnection()
//!     .with_reconnection_timeout(Duration::from_secs(1))
//!     .with_reconnection_error_handler(|err| eprintln!("redial failed: {}", err))
//!     .on("chat", |args| async move {
//!         println!("chat: {:?}", args);
//!     })
//!     .build_to_connect(url);
//!
//! client.dial().await?;
//! # Ok(())
//! # }
//! ```

use crate::channel::{Channel, SocketChannel};
use crate::client::{Client, ClientConfig};
use crate::handler::event_handler;
use crate::metrics::ClientMetrics;
use crate::reconnect::ReconnectionPolicy;
use crate::transport::{Transport, WebsocketTransport};
use serde_json::Value;
use sockio_core::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder {
    transport: Arc<dyn Transport>,
    channel: Arc<dyn Channel>,
    policy: ReconnectionPolicy,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder dialing through `transport` with the default channel
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_parts(transport, Arc::new(SocketChannel::new()))
    }

    /// Create a builder with the stock websocket transport
    pub fn websocket() -> Self {
        Self::new(Arc::new(WebsocketTransport::new()))
    }

    /// Create a builder with a custom channel
    pub fn with_parts(transport: Arc<dyn Transport>, channel: Arc<dyn Channel>) -> Self {
        Self {
            transport,
            channel,
            policy: ReconnectionPolicy::default(),
            service_name: None,
        }
    }

    /// Replace the transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Reconnect automatically after unexpected disconnects
    pub fn enable_reconnection(mut self) -> Self {
        self.policy.enable = true;
        self
    }

    /// Delay before each redial attempt
    pub fn with_reconnection_timeout(mut self, delay: Duration) -> Self {
        self.policy.retry_delay = delay;
        self
    }

    /// Callback receiving the error of every failed redial attempt
    pub fn with_reconnection_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.policy.on_error = Some(Arc::new(handler));
        self
    }

    /// Replace the whole reconnection policy
    pub fn with_reconnection_policy(mut self, policy: ReconnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register an event handler, reporting a failed registration to `on_subscribe_error`
    ///
    /// A rejected handler never aborts the chain.
    pub fn on_event<F, Fut, E>(self, event: &str, handler: F, on_subscribe_error: E) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        E: FnOnce(&str, Error),
    {
        if let Err(e) = self.channel.register_handler(event, event_handler(handler)) {
            on_subscribe_error(event, e);
        }
        self
    }

    /// Register an event handler, logging a failed registration
    pub fn on<F, Fut>(self, event: &str, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_event(event, handler, |event, e| {
            tracing::warn!(event = %event, error = %e, "Handler registration failed");
        })
    }

    /// Record OpenTelemetry metrics under `service_name`
    pub fn with_metrics(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Finalize the configuration
    ///
    /// Starts the reconnection supervisor when reconnection is enabled. The
    /// returned client is not connected. Must be called inside a Tokio
    /// runtime.
    pub fn build_to_connect(self, url: impl Into<String>) -> Client {
        let url = url.into();
        let metrics = self
            .service_name
            .map(|name| Arc::new(ClientMetrics::new(name)));

        tracing::debug!(url = %url, policy = ?self.policy, "Client built");

        Client::from_config(ClientConfig {
            transport: self.transport,
            channel: self.channel,
            policy: self.policy,
            url,
            metrics,
        })
    }
}
