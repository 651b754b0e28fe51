//! Client lifecycle integration tests
//!
//! Tests for client dialing, closing, and state management.

mod common;

use common::{wait_until, MockTransport, MockWsServer};
use serde_json::json;
use sockio_client::{Client, ClientBuilder, ConnectionState, WebsocketTransport};
use sockio_core::{get_url, Error};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);
const URL: &str = "ws://mock/socket.io/?EIO=3&transport=websocket";

#[tokio::test]
async fn test_dial_then_close() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone()).build_to_connect(URL);

    assert!(!client.is_open());
    client.dial().await.unwrap();
    assert!(client.is_open());

    client.close().await;
    assert!(!client.is_open());
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(transport.last_connection().close_count(), 1);
}

#[tokio::test]
async fn test_close_twice() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone())
        .enable_reconnection()
        .build_to_connect(URL);

    client.dial().await.unwrap();
    client.close().await;
    client.close().await;

    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(transport.last_connection().close_count(), 1);
}

#[tokio::test]
async fn test_close_without_dial() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone())
        .enable_reconnection()
        .build_to_connect(URL);

    client.close().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(transport.dial_count(), 0);
}

#[tokio::test]
async fn test_dial_while_open_is_rejected() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone()).build_to_connect(URL);

    client.dial().await.unwrap();
    assert!(matches!(client.dial().await, Err(Error::AlreadyConnected)));
    assert_eq!(transport.dial_count(), 1);
    assert!(client.is_open());

    client.close().await;
}

#[tokio::test]
async fn test_failed_dial_leaves_client_usable() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone())
        .enable_reconnection()
        .with_reconnection_timeout(Duration::from_millis(10))
        .build_to_connect(URL);

    transport.fail_next(1);
    let err = client.dial().await.unwrap_err();
    assert!(matches!(err, Error::WebSocket(ref msg) if msg == "refused"));
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // An initial dial failure is the caller's to handle, not the supervisor's
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(transport.dial_count(), 1);

    client.dial().await.unwrap();
    assert!(client.is_open());
    client.close().await;
}

#[tokio::test]
async fn test_close_does_not_trigger_reconnection() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone())
        .enable_reconnection()
        .with_reconnection_timeout(Duration::from_millis(10))
        .build_to_connect(URL);

    client.dial().await.unwrap();
    client.close().await;

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(transport.dial_count(), 1);
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_server_close_packet_is_a_disconnect() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone()).build_to_connect(URL);

    client.dial().await.unwrap();
    transport.last_connection().push("1");

    assert!(wait_until(WAIT, || client.state() == ConnectionState::Disconnected).await);
    assert_eq!(transport.last_connection().close_count(), 1);
}

#[tokio::test]
async fn test_disconnect_handler_runs_on_close() {
    let transport = MockTransport::new();
    let disconnects = Arc::new(AtomicUsize::new(0));
    let counter = disconnects.clone();

    let client = ClientBuilder::new(transport.clone())
        .on("disconnect", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build_to_connect(URL);

    client.dial().await.unwrap();
    client.close().await;
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disconnect_handler_sees_closed_client_and_can_redial() {
    let transport = MockTransport::new();
    let slot: Arc<OnceLock<Client>> = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handler_slot = slot.clone();
    let handler_seen = seen.clone();
    let client = ClientBuilder::new(transport.clone())
        .on("disconnect", move |_| {
            let slot = handler_slot.clone();
            let seen = handler_seen.clone();
            async move {
                if let Some(client) = slot.get() {
                    let was_open = client.is_open();
                    let redial = client.dial().await;
                    seen.lock().unwrap().push((was_open, redial));
                }
            }
        })
        .build_to_connect(URL);
    slot.set(client.clone()).unwrap();

    client.dial().await.unwrap();
    transport.last_connection().fail();

    assert!(wait_until(WAIT, || !seen.lock().unwrap().is_empty()).await);
    {
        let seen = seen.lock().unwrap();
        assert!(!seen[0].0);
        assert!(seen[0].1.is_ok(), "redial failed: {:?}", seen[0].1);
    }
    assert!(client.is_open());
    assert_eq!(transport.dial_count(), 2);

    client.close().await;
}

#[tokio::test]
async fn test_emit_after_close_is_rejected() {
    let transport = MockTransport::new();
    let client = ClientBuilder::new(transport.clone()).build_to_connect(URL);

    client.dial().await.unwrap();
    client.close().await;
    assert!(matches!(
        client.emit("chat", vec![json!("late")]).await,
        Err(Error::ClientClosed)
    ));
}

#[tokio::test]
async fn test_websocket_round_trip() {
    let mut server = MockWsServer::new().await;
    let mut frames = server.take_message_receiver().unwrap();
    let connected = Arc::new(AtomicUsize::new(0));
    let counter = connected.clone();

    let url = get_url("127.0.0.1", server.port(), false, &HashMap::new());
    let client = ClientBuilder::websocket()
        .on("connect", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build_to_connect(url);

    client.dial().await.unwrap();
    assert!(wait_until(WAIT, || connected.load(Ordering::SeqCst) == 1).await);

    client.emit("hello", vec![json!({"n": 1})]).await.unwrap();
    let frame = tokio::time::timeout(WAIT, frames.recv()).await.unwrap();
    assert_eq!(frame.as_deref(), Some(r#"42["hello",{"n":1}]"#));

    client.close().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_websocket_dial_refused() {
    let transport = Arc::new(WebsocketTransport::new().with_connect_timeout(Duration::from_secs(1)));
    let client = ClientBuilder::new(transport)
        .build_to_connect(get_url("127.0.0.1", 1, false, &HashMap::new()));

    assert!(client.dial().await.is_err());
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
