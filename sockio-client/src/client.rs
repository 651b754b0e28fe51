//! Socket.IO client: connection lifecycle
//!
//! This module provides the [`Client`] type, which dials the transport,
//! hands each new connection to the channel, and reacts when that
//! connection goes away.
//!
//! # Client Lifecycle
//!
//! 1. **Build**: `ClientBuilder` registers handlers and fixes the configuration
//! 2. **Dial**: open a connection and start the channel's pumps
//! 3. **Reconnect** (optional): the supervisor redials after unexpected drops
//! 4. **Close**: stop the pumps; the client cannot be dialed again
//!
//! # Cloning
//!
//! `Client` is cheaply cloneable using `Arc` internally. All clones share the
//! same connection and state.
//!
//! # Locking
//!
//! A single async mutex guards the lifecycle state and the connection
//! handle. It is held across the transport connect in `dial`, and never
//! while the channel runs user handlers.

use crate::channel::{Channel, DisconnectCallback};
use crate::connection_state::ConnectionState;
use crate::metrics::ClientMetrics;
use crate::reconnect::ReconnectionPolicy;
use crate::supervisor::{self, ReconnectNotifier};
use crate::transport::{Connection, Transport};
use serde_json::Value;
use sockio_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};

/// Everything a client needs, assembled once by `ClientBuilder`
pub(crate) struct ClientConfig {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) channel: Arc<dyn Channel>,
    pub(crate) policy: ReconnectionPolicy,
    pub(crate) url: String,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

struct Lifecycle {
    state: ConnectionState,
    connection: Option<Arc<dyn Connection>>,
}

pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    channel: Arc<dyn Channel>,
    policy: ReconnectionPolicy,
    url: String,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<ConnectionState>,
    notifier: Option<ReconnectNotifier>,
    metrics: Option<Arc<ClientMetrics>>,
}

/// Socket.IO client over a pluggable transport
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Finalize a configuration into a client
    ///
    /// Installs the disconnect callback and, if reconnection is enabled,
    /// starts the supervisor. Must be called inside a Tokio runtime.
    pub(crate) fn from_config(config: ClientConfig) -> Self {
        let (notifier, signals) = if config.policy.enable {
            let (notifier, signals) = ReconnectNotifier::new();
            (Some(notifier), Some(signals))
        } else {
            (None, None)
        };
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        let inner = Arc::new(ClientInner {
            transport: config.transport,
            channel: config.channel,
            policy: config.policy,
            url: config.url,
            lifecycle: Mutex::new(Lifecycle {
                state: ConnectionState::Disconnected,
                connection: None,
            }),
            state_tx,
            notifier,
            metrics: config.metrics,
        });

        let weak = Arc::downgrade(&inner);
        let callback: DisconnectCallback = Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_disconnect().await;
                }
            })
        });
        inner.channel.set_disconnect_callback(callback);

        if let Some(signals) = signals {
            supervisor::spawn(Arc::downgrade(&inner), signals);
        }

        Self { inner }
    }

    /// Open a connection and start servicing it
    ///
    /// On failure the error is returned unchanged and the client stays
    /// usable for another attempt.
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyConnected` if a connection is already being serviced
    /// - `Error::ClientClosed` after [`close`](Self::close)
    /// - Whatever the transport returned if the connect failed
    #[tracing::instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn dial(&self) -> Result<()> {
        self.inner.dial().await
    }

    /// Close the client
    ///
    /// Stops the pumps, closes the connection and permanently disables
    /// reconnection. Calling it again is a no-op.
    pub async fn close(&self) {
        self.inner.close().await
    }

    /// Queue an event for the server
    ///
    /// Events queued while the client is reconnecting are sent after the
    /// next successful dial.
    pub async fn emit(&self, event: &str, args: Vec<Value>) -> Result<()> {
        if self.state().is_closed() {
            return Err(Error::ClientClosed);
        }
        self.inner.channel.emit(event, args).await
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Whether a connection is currently being serviced
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Watch lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// The URL this client dials
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The reconnection policy fixed at build time
    pub fn policy(&self) -> &ReconnectionPolicy {
        &self.inner.policy
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .field("policy", &self.inner.policy)
            .finish()
    }
}

impl ClientInner {
    pub(crate) fn policy(&self) -> &ReconnectionPolicy {
        &self.policy
    }

    async fn dial(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.dial_locked(&mut lifecycle).await
    }

    /// Supervisor entry point: record the attempt, then dial
    ///
    /// A client that is already open or closed is rejected before anything
    /// is recorded.
    pub(crate) async fn redial(&self, attempt: u32) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        ensure_dialable(lifecycle.state)?;
        if let ConnectionState::Reconnecting { .. } = lifecycle.state {
            self.set_state(&mut lifecycle, ConnectionState::Reconnecting { attempt });
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_reconnection_attempt();
        }
        self.dial_locked(&mut lifecycle).await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_reconnection_success();
        }
        Ok(())
    }

    async fn dial_locked(&self, lifecycle: &mut MutexGuard<'_, Lifecycle>) -> Result<()> {
        ensure_dialable(lifecycle.state)?;

        let connection = match self.transport.connect(&self.url).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::debug!(error = %e, "Dial failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_dial_failure(&e);
                }
                return Err(e);
            }
        };

        lifecycle.connection = Some(Arc::clone(&connection));
        self.channel.attach(connection);
        self.channel.set_alive(true);
        self.start_pumps();
        self.set_state(lifecycle, ConnectionState::Connected);

        tracing::info!(url = %self.url, "Connected");
        Ok(())
    }

    fn start_pumps(&self) {
        let inbound = Arc::clone(&self.channel);
        tokio::spawn(async move { inbound.run_inbound_pump().await });

        let outbound = Arc::clone(&self.channel);
        tokio::spawn(async move { outbound.run_outbound_pump().await });

        let heartbeat = Arc::clone(&self.channel);
        tokio::spawn(async move { heartbeat.run_heartbeat_pump().await });
    }

    async fn close(&self) {
        {
            let mut lifecycle = self.lifecycle.lock().await;
            if lifecycle.state.is_closed() {
                return;
            }
            lifecycle.connection = None;
            self.set_state(&mut lifecycle, ConnectionState::Closed);
            if let Some(notifier) = &self.notifier {
                notifier.shutdown();
            }
        }
        // Outside the lock: channel teardown runs the user's disconnect handler
        self.channel.close().await;
        tracing::info!(url = %self.url, "Client closed");
    }

    /// Called by the channel when the connection drops on its own
    async fn handle_disconnect(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if !lifecycle.state.is_open() {
            return;
        }
        lifecycle.connection = None;
        if let Some(metrics) = &self.metrics {
            metrics.record_disconnect();
        }

        match &self.notifier {
            Some(notifier) if notifier.is_active() => {
                self.set_state(&mut lifecycle, ConnectionState::Reconnecting { attempt: 0 });
                notifier.notify();
                tracing::warn!(url = %self.url, "Connection lost, reconnecting");
            }
            _ => {
                self.set_state(&mut lifecycle, ConnectionState::Disconnected);
                tracing::warn!(url = %self.url, "Connection lost");
            }
        }
    }

    fn set_state(&self, lifecycle: &mut Lifecycle, state: ConnectionState) {
        lifecycle.state = state;
        self.state_tx.send_replace(state);
        if let Some(metrics) = &self.metrics {
            metrics.update_connection_state(state);
        }
    }
}

fn ensure_dialable(state: ConnectionState) -> Result<()> {
    match state {
        ConnectionState::Connected => Err(Error::AlreadyConnected),
        ConnectionState::Closed => Err(Error::ClientClosed),
        ConnectionState::Disconnected | ConnectionState::Reconnecting { .. } => Ok(()),
    }
}
