//! Chat client example
//!
//! Joins a room on a Socket.IO v2 server, prints chat messages and keeps
//! reconnecting while the server restarts. Logs go through `tracing`;
//! metrics are exported when an OTLP collector is listening.
//!
//! Run with: cargo run --example chat_client -- [host] [port]

use serde_json::json;
use sockio::{get_url, ClientBuilder, ObservabilityConfig};
use std::collections::HashMap;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().map(|p| p.parse()).transpose()?.unwrap_or(3000);

    sockio::core::init_observability(
        ObservabilityConfig::new("sockio-chat-client")
            .with_endpoint("http://localhost:4317")
            .with_metrics(true)
            .with_log_level("info"),
    )?;

    let mut params = HashMap::new();
    params.insert("room".to_string(), "lobby".to_string());
    let url = get_url(&host, port, false, &params);

    let client = ClientBuilder::websocket()
        .enable_reconnection()
        .with_reconnection_timeout(Duration::from_secs(2))
        .with_reconnection_error_handler(|err| {
            tracing::warn!(error = %err, "Still unable to reach the server");
        })
        .with_metrics("sockio-chat-client")
        .on("connect", |_| async {
            println!("connected");
        })
        .on("chat", |args| async move {
            println!("chat: {}", serde_json::Value::Array(args));
        })
        .on("disconnect", |_| async {
            println!("disconnected");
        })
        .build_to_connect(url);

    client.dial().await?;
    client.emit("join", vec![json!("lobby")]).await?;

    let mut states = client.subscribe_state();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = async {
            while states.changed().await.is_ok() {
                tracing::info!(state = ?*states.borrow(), "State changed");
            }
        } => {}
    }

    client.close().await;
    sockio::core::shutdown_observability();
    Ok(())
}
