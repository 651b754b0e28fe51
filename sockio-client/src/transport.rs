//! Transport capability
//!
//! A [`Transport`] opens connections; a [`Connection`] moves text frames over
//! one open socket. The client only ever holds a `Arc<dyn Transport>`, so
//! tests and alternative stacks can plug in their own implementation.
//!
//! [`WebsocketTransport`] is the stock implementation on top of
//! `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use sockio_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens connections to a URL
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection
    ///
    /// Failures are returned unchanged to the caller of `Client::dial`.
    async fn connect(&self, url: &str) -> Result<Arc<dyn Connection>>;
}

/// One open, message-oriented connection
///
/// Reads and writes may run concurrently from different tasks.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Wait for the next text frame
    ///
    /// Returns `Error::ConnectionClosed` once the peer closed the socket.
    async fn read_message(&self) -> Result<String>;

    /// Send one text frame
    async fn write_message(&self, text: String) -> Result<()>;

    /// Close the connection. Idempotent.
    async fn close(&self);
}

/// Transport over `tokio-tungstenite` websockets
#[derive(Debug, Clone, Default)]
pub struct WebsocketTransport {
    connect_timeout: Option<Duration>,
}

impl WebsocketTransport {
    /// Create a transport without a connect timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `connect` with `Error::ConnectTimeout` if the handshake takes longer than `timeout`
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The configured connect timeout, if any
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }
}

#[async_trait]
impl Transport for WebsocketTransport {
    #[tracing::instrument(skip(self))]
    async fn connect(&self, url: &str) -> Result<Arc<dyn Connection>> {
        let handshake = connect_async(url);
        let result = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| Error::ConnectTimeout(limit))?,
            None => handshake.await,
        };
        let (ws_stream, _) = result.map_err(|e| Error::WebSocket(e.to_string()))?;
        tracing::debug!("WebSocket handshake completed");

        let (sink, stream) = ws_stream.split();
        Ok(Arc::new(WebsocketConnection {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }))
    }
}

/// A websocket connection split into independently locked halves
pub struct WebsocketConnection {
    sink: Mutex<futures::stream::SplitSink<WsStream, Message>>,
    stream: Mutex<futures::stream::SplitStream<WsStream>>,
}

#[async_trait]
impl Connection for WebsocketConnection {
    async fn read_message(&self) -> Result<String> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Close(_))) | None => return Err(Error::ConnectionClosed),
                // Binary attachments are not supported; ping/pong frames are answered by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
            }
        }
    }

    async fn write_message(&self, text: String) -> Result<()> {
        self.sink
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}
