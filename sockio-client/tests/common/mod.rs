//! Common test utilities for sockio-client integration tests
//!
//! This module provides a scripted in-memory transport and a minimal
//! websocket server for testing client behavior without a real Socket.IO
//! server.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use sockio_client::{Connection, Transport};
use sockio_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Server side of one [`MockConnection`]
#[derive(Clone)]
pub struct ConnectionHandle {
    inbound: UnboundedSender<Result<String>>,
    written: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl ConnectionHandle {
    /// Deliver a frame to the client
    pub fn push(&self, frame: &str) {
        let _ = self.inbound.send(Ok(frame.to_string()));
    }

    /// Break the connection as if the network went away
    pub fn fail(&self) {
        let _ = self.inbound.send(Err(Error::WebSocket("connection reset".into())));
    }

    /// Frames the client wrote so far
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }

    /// How many times the client closed this connection
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// In-memory connection driven through a [`ConnectionHandle`]
pub struct MockConnection {
    inbound: tokio::sync::Mutex<UnboundedReceiver<Result<String>>>,
    written: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl MockConnection {
    pub fn new() -> (Arc<Self>, ConnectionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let written = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicUsize::new(0));
        let conn = Arc::new(Self {
            inbound: tokio::sync::Mutex::new(rx),
            written: written.clone(),
            closed: closed.clone(),
        });
        let handle = ConnectionHandle {
            inbound: tx,
            written,
            closed,
        };
        (conn, handle)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn read_message(&self) -> Result<String> {
        match self.inbound.lock().await.recv().await {
            Some(frame) => frame,
            None => Err(Error::ConnectionClosed),
        }
    }

    async fn write_message(&self, text: String) -> Result<()> {
        self.written.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport that refuses a scripted number of dials, then succeeds
///
/// Every dial is timestamped, and every successful dial leaves a
/// [`ConnectionHandle`] behind for the test to drive.
pub struct MockTransport {
    failures_left: AtomicUsize,
    dials: Mutex<Vec<Instant>>,
    connections: Mutex<Vec<ConnectionHandle>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(0),
            dials: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
        })
    }

    /// Refuse the next `count` dials
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn dial_count(&self) -> usize {
        self.dials.lock().unwrap().len()
    }

    pub fn dial_times(&self) -> Vec<Instant> {
        self.dials.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Handle of the most recent successful dial
    pub fn last_connection(&self) -> ConnectionHandle {
        self.connections
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection dialed yet")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, _url: &str) -> Result<Arc<dyn Connection>> {
        self.dials.lock().unwrap().push(Instant::now());

        let refuse = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(Error::WebSocket("refused".into()));
        }

        let (conn, handle) = MockConnection::new();
        self.connections.lock().unwrap().push(handle);
        Ok(conn)
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    condition()
}

/// Mock WebSocket server for client testing
///
/// Sends an Engine.IO handshake and a namespace connect to every client,
/// answers pings with pongs, and forwards every other frame to the test.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    message_rx: Option<mpsc::Receiver<String>>,
}

impl MockWsServer {
    /// Start a new mock server
    pub async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (msg_tx, msg_rx) = mpsc::channel::<String>(100);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let msg_tx = msg_tx.clone();
                        tokio::spawn(async move {
                            let Ok(ws) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws.split();

                            let open = r#"0{"sid":"mock","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#;
                            if write.send(Message::Text(open.into())).await.is_err() {
                                return;
                            }
                            if write.send(Message::Text("40".into())).await.is_err() {
                                return;
                            }

                            while let Some(Ok(msg)) = read.next().await {
                                let Message::Text(text) = msg else { continue };
                                if text == "2" {
                                    let _ = write.send(Message::Text("3".into())).await;
                                } else {
                                    let _ = msg_tx.send(text).await;
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            message_rx: Some(msg_rx),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Take the receiver of frames sent by clients
    pub fn take_message_receiver(&mut self) -> Option<mpsc::Receiver<String>> {
        self.message_rx.take()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
