//! Connection URL helpers
//!
//! Socket.IO servers speaking Engine.IO v3 expect websocket clients on a
//! fixed path with the protocol revision and transport in the query string:
//!
//! ```text
//! ws://myserver.com:80/socket.io/?EIO=3&transport=websocket
//! ```
//!
//! [`get_url`] assembles that address from its parts.

use std::collections::HashMap;

/// Scheme prefix for plain websocket connections
pub const WS_SCHEME: &str = "ws://";

/// Scheme prefix for TLS websocket connections
pub const WSS_SCHEME: &str = "wss://";

/// Path and fixed query of the Socket.IO websocket endpoint
pub const SOCKET_IO_PATH: &str = "/socket.io/?EIO=3&transport=websocket";

/// Build a `ws://` or `wss://` Socket.IO URL for a host and port
///
/// Every entry in `params` is appended as `&key=value`. Values are used
/// verbatim, so callers must escape them if needed. The order of the
/// appended parameters follows the map's iteration order and is not stable.
///
/// # Examples
///
/// ```rust
/// use sockio_core::get_url;
/// use std::collections::HashMap;
///
/// let url = get_url("localhost", 3000, false, &HashMap::new());
/// assert_eq!(url, "ws://localhost:3000/socket.io/?EIO=3&transport=websocket");
/// ```
pub fn get_url(host: &str, port: u16, secure: bool, params: &HashMap<String, String>) -> String {
    let scheme = if secure { WSS_SCHEME } else { WS_SCHEME };
    let mut url = format!("{}{}:{}{}", scheme, host, port, SOCKET_IO_PATH);
    for (key, value) in params {
        url.push('&');
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url
}
