//! Codec for Engine.IO v3 / Socket.IO text frames
//!
//! This module converts between [`Packet`] values and the strings that
//! travel in websocket text frames. See [`crate::types`] for the layout of
//! the type digits.
//!
//! # Namespaces
//!
//! Only the default namespace is supported. An explicit `/,` prefix on an
//! inbound Socket.IO packet is stripped; packets addressed to any other
//! namespace decode to [`Packet::Noop`]. Outbound packets never carry a
//! namespace.
//!
//! # Examples
//!
//! ```rust
//! use sockio_core::{codec, Packet};
//! use serde_json::json;
//!
//! let text = codec::encode(&Packet::event("chat", vec![json!("hi")])).unwrap();
//! assert_eq!(text, r#"42["chat","hi"]"#);
//!
//! let decoded = codec::decode(&text).unwrap();
//! assert_eq!(decoded, Packet::event("chat", vec![json!("hi")]));
//! ```

use crate::error::{Error, Result};
use crate::types::{engine, socket, Handshake, Packet};
use serde_json::Value;

/// Encode a packet into the text of a websocket frame
///
/// # Errors
///
/// Returns `Error::Serialization` if the handshake or the event arguments
/// cannot be serialized.
pub fn encode(packet: &Packet) -> Result<String> {
    let text = match packet {
        Packet::Open(handshake) => {
            format!("{}{}", engine::OPEN, serde_json::to_string(handshake)?)
        }
        Packet::Close => engine::CLOSE.to_string(),
        Packet::Ping => engine::PING.to_string(),
        Packet::Pong => engine::PONG.to_string(),
        Packet::Upgrade => engine::UPGRADE.to_string(),
        Packet::Noop => engine::NOOP.to_string(),
        Packet::Connect => message_prefix(socket::CONNECT),
        Packet::Disconnect => message_prefix(socket::DISCONNECT),
        Packet::Event { name, args, ack_id } => {
            let mut payload = Vec::with_capacity(args.len() + 1);
            payload.push(Value::String(name.clone()));
            payload.extend(args.iter().cloned());
            format!(
                "{}{}{}",
                message_prefix(socket::EVENT),
                ack_id.map(|id| id.to_string()).unwrap_or_default(),
                serde_json::to_string(&payload)?
            )
        }
        Packet::Ack { id, args } => format!(
            "{}{}{}",
            message_prefix(socket::ACK),
            id,
            serde_json::to_string(args)?
        ),
        Packet::Error(message) => format!(
            "{}{}",
            message_prefix(socket::ERROR),
            serde_json::to_string(message)?
        ),
    };
    Ok(text)
}

/// Decode the text of a websocket frame into a packet
///
/// # Errors
///
/// Returns `Error::Decode` for empty frames, unknown type digits, malformed
/// ack ids, and event payloads that are not a JSON array starting with the
/// event name.
pub fn decode(data: &str) -> Result<Packet> {
    let kind = data
        .chars()
        .next()
        .ok_or_else(|| Error::Decode("empty packet".to_string()))?;

    match kind {
        engine::OPEN => {
            let handshake: Handshake = serde_json::from_str(&data[1..])
                .map_err(|e| Error::Decode(format!("invalid handshake: {}", e)))?;
            Ok(Packet::Open(handshake))
        }
        engine::CLOSE => Ok(Packet::Close),
        // "2probe" / "3probe" belong to the upgrade dance and count as heartbeats
        engine::PING => Ok(Packet::Ping),
        engine::PONG => Ok(Packet::Pong),
        engine::UPGRADE => Ok(Packet::Upgrade),
        engine::NOOP => Ok(Packet::Noop),
        engine::MESSAGE => decode_message(&data[1..]),
        other => Err(Error::Decode(format!("unknown packet type '{}'", other))),
    }
}

fn message_prefix(kind: char) -> String {
    let mut prefix = String::with_capacity(2);
    prefix.push(engine::MESSAGE);
    prefix.push(kind);
    prefix
}

fn decode_message(body: &str) -> Result<Packet> {
    let kind = body
        .chars()
        .next()
        .ok_or_else(|| Error::Decode("empty message packet".to_string()))?;
    if !kind.is_ascii_digit() {
        return Err(Error::Decode(format!("unknown message type '{}'", kind)));
    }
    let Some(payload) = default_namespace_payload(&body[1..]) else {
        // Only the default namespace is joined; other namespaces are dropped
        return Ok(Packet::Noop);
    };

    match kind {
        socket::CONNECT => Ok(Packet::Connect),
        socket::DISCONNECT => Ok(Packet::Disconnect),
        socket::EVENT => {
            let (ack_id, args) = split_ack_id(payload)?;
            let mut values = parse_array(args)?.into_iter();
            match values.next() {
                Some(Value::String(name)) => Ok(Packet::Event {
                    name,
                    args: values.collect(),
                    ack_id,
                }),
                _ => Err(Error::Decode("event payload has no name".to_string())),
            }
        }
        socket::ACK => {
            let (ack_id, args) = split_ack_id(payload)?;
            let id = ack_id.ok_or_else(|| Error::Decode("ack without id".to_string()))?;
            Ok(Packet::Ack {
                id,
                args: parse_array(args)?,
            })
        }
        socket::ERROR => {
            let message = match serde_json::from_str::<Value>(payload) {
                Ok(Value::String(s)) => s,
                _ => payload.to_string(),
            };
            Ok(Packet::Error(message))
        }
        other => Err(Error::Decode(format!("unknown message type '{}'", other))),
    }
}

/// Strip an explicit `/` namespace. None for any other namespace.
fn default_namespace_payload(payload: &str) -> Option<&str> {
    if !payload.starts_with('/') {
        return Some(payload);
    }
    let (namespace, rest) = match payload.find(',') {
        Some(idx) => (&payload[..idx], &payload[idx + 1..]),
        None => (payload, ""),
    };
    (namespace == "/").then_some(rest)
}

fn split_ack_id(payload: &str) -> Result<(Option<u64>, &str)> {
    let split = payload
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(payload.len());
    let (digits, rest) = payload.split_at(split);
    if digits.is_empty() {
        return Ok((None, rest));
    }
    let id = digits
        .parse::<u64>()
        .map_err(|e| Error::Decode(format!("invalid ack id '{}': {}", digits, e)))?;
    Ok((Some(id), rest))
}

fn parse_array(payload: &str) -> Result<Vec<Value>> {
    serde_json::from_str(payload).map_err(|e| Error::Decode(format!("invalid payload: {}", e)))
}
