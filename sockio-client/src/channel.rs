//! Channel: the protocol engine between a connection and the event handlers
//!
//! A [`Channel`] owns the live connection, an aliveness flag and the three
//! pumps that service it:
//!
//! - **Inbound pump**: reads frames, decodes packets, dispatches events
//! - **Outbound pump**: drains the outbound queue onto the connection
//! - **Heartbeat pump**: pings the server and detects silent connections
//!
//! The client starts the pumps after each successful dial and stops them on
//! close. When the connection dies on its own, the first pump to notice
//! marks the channel dead and fires the disconnect callback, exactly once
//! per connection.
//!
//! # Generations
//!
//! Each [`Channel::attach`] starts a new generation. Pumps remember the
//! generation they were started for and exit as soon as it is no longer
//! current, so pumps of a dead connection can never tear down its
//! replacement.

use crate::handler::{EventHandler, HandlerRegistry};
use crate::transport::Connection;
use async_trait::async_trait;
use serde_json::Value;
use sockio_core::{codec, Error, Packet, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Callback fired when a connection is lost without the client closing it
pub type DisconnectCallback =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Event dispatched when the server acknowledges the namespace connection
pub const CONNECT_EVENT: &str = "connect";

/// Event dispatched when the connection goes away
pub const DISCONNECT_EVENT: &str = "disconnect";

/// Event dispatched for Socket.IO error packets
pub const ERROR_EVENT: &str = "error";

/// Protocol engine capability driven by the client
#[async_trait]
pub trait Channel: Send + Sync {
    /// Hand a freshly opened connection to the channel
    fn attach(&self, connection: Arc<dyn Connection>);

    /// Mark the attached connection alive or dead
    fn set_alive(&self, alive: bool);

    /// Whether the attached connection is being serviced
    fn is_alive(&self) -> bool;

    /// Read and dispatch inbound packets until the connection dies
    async fn run_inbound_pump(&self);

    /// Write queued outbound frames until the connection dies
    async fn run_outbound_pump(&self);

    /// Keep the connection alive with pings until it dies
    async fn run_heartbeat_pump(&self);

    /// Install the callback fired on an unexpected disconnect
    fn set_disconnect_callback(&self, callback: DisconnectCallback);

    /// Stop the pumps and close the connection without firing the callback
    async fn close(&self);

    /// Register a handler for an inbound event
    fn register_handler(&self, event: &str, handler: EventHandler) -> Result<()>;

    /// Queue an event for the server
    async fn emit(&self, event: &str, args: Vec<Value>) -> Result<()>;
}

/// Heartbeat and queue settings for [`SocketChannel`]
///
/// The ping values are fallbacks; the server handshake overrides them.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Time between client pings
    pub ping_interval: Duration,
    /// Extra time allowed for the pong after a ping
    pub ping_timeout: Duration,
    /// Capacity of the outbound frame queue
    pub queue_capacity: usize,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(5),
            queue_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Liveness {
    generation: u64,
    alive: bool,
}

/// Default [`Channel`] speaking Engine.IO v3 / Socket.IO text frames
pub struct SocketChannel {
    liveness: watch::Sender<Liveness>,
    connection: RwLock<Option<Arc<dyn Connection>>>,
    handlers: HandlerRegistry,
    outbound_tx: mpsc::Sender<String>,
    outbound_rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
    on_disconnect: RwLock<Option<DisconnectCallback>>,
    ping: Mutex<(Duration, Duration)>,
    last_pong: Mutex<Instant>,
}

impl SocketChannel {
    /// Create a channel with default heartbeat settings
    pub fn new() -> Self {
        Self::with_config(HeartbeatConfig::default())
    }

    /// Create a channel with custom heartbeat settings
    pub fn with_config(config: HeartbeatConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (liveness, _) = watch::channel(Liveness::default());
        Self {
            liveness,
            connection: RwLock::new(None),
            handlers: HandlerRegistry::new(),
            outbound_tx,
            outbound_rx: tokio::sync::Mutex::new(outbound_rx),
            on_disconnect: RwLock::new(None),
            ping: Mutex::new((config.ping_interval, config.ping_timeout)),
            last_pong: Mutex::new(Instant::now()),
        }
    }

    /// The handler registry shared by every connection of this channel
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Current ping interval and timeout
    pub fn ping_params(&self) -> (Duration, Duration) {
        self.ping.lock().map(|p| *p).unwrap_or_default()
    }

    fn generation(&self) -> u64 {
        self.liveness.borrow().generation
    }

    fn current_connection(&self) -> Option<Arc<dyn Connection>> {
        self.connection.read().ok().and_then(|conn| conn.clone())
    }

    fn touch_pong(&self) {
        if let Ok(mut last) = self.last_pong.lock() {
            *last = Instant::now();
        }
    }

    fn since_last_pong(&self) -> Duration {
        self.last_pong
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    /// Resolves once `generation` is dead or replaced
    async fn stopped(&self, generation: u64) {
        let mut rx = self.liveness.subscribe();
        // The sender lives as long as `self`, so this only errs during teardown
        let _ = rx
            .wait_for(|state| !state.alive || state.generation != generation)
            .await;
    }

    /// Tear down `generation` after a transport failure
    ///
    /// Only the first caller for a live generation gets past the flag flip,
    /// which makes the disconnect callback fire once per connection. The
    /// callback runs before the `disconnect` handler, so the handler already
    /// sees the client as not open.
    async fn connection_lost(&self, generation: u64) {
        let flipped = self.liveness.send_if_modified(|state| {
            if state.generation == generation && state.alive {
                state.alive = false;
                true
            } else {
                false
            }
        });
        if !flipped {
            return;
        }

        tracing::info!(generation, "Connection lost");
        let connection = self.connection.write().ok().and_then(|mut conn| conn.take());
        if let Some(connection) = connection {
            connection.close().await;
        }

        let callback = self.on_disconnect.read().ok().and_then(|cb| cb.clone());
        if let Some(callback) = callback {
            callback().await;
        }
        self.handlers.dispatch(DISCONNECT_EVENT, Vec::new()).await;
    }

    /// Handle one inbound frame. Returns false when the server closed the session.
    async fn handle_frame(&self, text: &str) -> bool {
        let packet = match codec::decode(text) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed packet");
                return true;
            }
        };
        tracing::trace!(kind = packet.kind(), "Packet received");

        match packet {
            Packet::Open(handshake) => {
                tracing::debug!(
                    sid = %handshake.sid,
                    ping_interval_ms = handshake.ping_interval,
                    ping_timeout_ms = handshake.ping_timeout,
                    "Session opened"
                );
                if let Ok(mut ping) = self.ping.lock() {
                    *ping = (handshake.ping_interval(), handshake.ping_timeout());
                }
                self.touch_pong();
            }
            Packet::Ping => {
                let pong = codec::encode(&Packet::Pong).unwrap_or_default();
                if self.outbound_tx.try_send(pong).is_err() {
                    tracing::warn!("Outbound queue full, pong dropped");
                }
            }
            Packet::Pong => self.touch_pong(),
            Packet::Connect => {
                self.handlers.dispatch(CONNECT_EVENT, Vec::new()).await;
            }
            Packet::Event { name, args, ack_id } => {
                if let Some(ack_id) = ack_id {
                    // Handlers return nothing, so there is no reply to send
                    tracing::debug!(
                        event = %name,
                        ack_id,
                        "Event requested an acknowledgement; not answered"
                    );
                }
                self.handlers.dispatch(&name, args).await;
            }
            Packet::Ack { id, .. } => {
                tracing::debug!(ack_id = id, "Ignoring acknowledgement");
            }
            Packet::Error(message) => {
                tracing::warn!(error = %message, "Server reported an error");
                self.handlers
                    .dispatch(ERROR_EVENT, vec![Value::String(message)])
                    .await;
            }
            Packet::Close | Packet::Disconnect => {
                tracing::info!("Session closed by server");
                return false;
            }
            Packet::Noop | Packet::Upgrade => {}
        }
        true
    }
}

impl Default for SocketChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for SocketChannel {
    fn attach(&self, connection: Arc<dyn Connection>) {
        if let Ok(mut current) = self.connection.write() {
            *current = Some(connection);
        }
        self.liveness.send_modify(|state| {
            state.generation += 1;
            state.alive = false;
        });
        self.touch_pong();
    }

    fn set_alive(&self, alive: bool) {
        self.liveness.send_modify(|state| state.alive = alive);
    }

    fn is_alive(&self) -> bool {
        self.liveness.borrow().alive
    }

    async fn run_inbound_pump(&self) {
        let generation = self.generation();
        let Some(connection) = self.current_connection() else {
            return;
        };

        loop {
            let frame = tokio::select! {
                _ = self.stopped(generation) => return,
                frame = connection.read_message() => frame,
            };
            match frame {
                Ok(text) => {
                    if !self.handle_frame(&text).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Inbound pump stopped");
                    break;
                }
            }
        }
        self.connection_lost(generation).await;
    }

    async fn run_outbound_pump(&self) {
        let generation = self.generation();
        let Some(connection) = self.current_connection() else {
            return;
        };

        let mut queue = tokio::select! {
            _ = self.stopped(generation) => return,
            queue = self.outbound_rx.lock() => queue,
        };
        loop {
            let text = tokio::select! {
                _ = self.stopped(generation) => return,
                text = queue.recv() => match text {
                    Some(text) => text,
                    None => return,
                },
            };
            if let Err(e) = connection.write_message(text).await {
                tracing::warn!(error = %e, "Outbound pump stopped");
                break;
            }
        }
        self.connection_lost(generation).await;
    }

    async fn run_heartbeat_pump(&self) {
        let generation = self.generation();
        let Some(connection) = self.current_connection() else {
            return;
        };

        loop {
            let (interval, timeout) = self.ping_params();
            tokio::select! {
                _ = self.stopped(generation) => return,
                _ = tokio::time::sleep(interval) => {}
            }
            if self.since_last_pong() > interval + timeout {
                tracing::warn!(
                    interval_ms = interval.as_millis() as u64,
                    timeout_ms = timeout.as_millis() as u64,
                    "Heartbeat timed out"
                );
                break;
            }
            let ping = codec::encode(&Packet::Ping).unwrap_or_default();
            if let Err(e) = connection.write_message(ping).await {
                tracing::debug!(error = %e, "Heartbeat pump stopped");
                break;
            }
        }
        self.connection_lost(generation).await;
    }

    fn set_disconnect_callback(&self, callback: DisconnectCallback) {
        if let Ok(mut current) = self.on_disconnect.write() {
            *current = Some(callback);
        }
    }

    async fn close(&self) {
        let was_alive = self.liveness.send_if_modified(|state| {
            let was_alive = state.alive;
            state.alive = false;
            was_alive
        });
        let connection = self.connection.write().ok().and_then(|mut conn| conn.take());
        if let Some(connection) = connection {
            connection.close().await;
        }
        if was_alive {
            self.handlers.dispatch(DISCONNECT_EVENT, Vec::new()).await;
        }
    }

    fn register_handler(&self, event: &str, handler: EventHandler) -> Result<()> {
        self.handlers.insert(event.to_string(), handler)
    }

    async fn emit(&self, event: &str, args: Vec<Value>) -> Result<()> {
        let text = codec::encode(&Packet::event(event, args))?;
        self.outbound_tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::OutboundQueueFull,
            mpsc::error::TrySendError::Closed(_) => Error::ConnectionClosed,
        })
    }
}
