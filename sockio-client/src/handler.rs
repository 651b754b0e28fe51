//! Event handler registry
//!
//! Socket.IO events are named messages carrying a list of JSON arguments.
//! This module stores one async handler per event name and dispatches
//! inbound events to it.
//!
//! The registry belongs to the channel rather than to a connection, so
//! registrations made through the builder keep working across reconnects.
//!
//! # Examples
//!
//! ```rust
//! use sockio_client::HandlerRegistry;
//!
//! # async fn example() -> sockio_core::Result<()> {
//! let registry = HandlerRegistry::new();
//! registry.register("chat", |args| async move {
//!     println!("chat: {:?}", args);
//! })?;
//! assert!(registry.has_handler("chat"));
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use sockio_core::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

/// Type for event handler functions
pub type EventHandler =
    Arc<dyn Fn(Vec<Value>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Wrap an async closure into an [`EventHandler`]
pub fn event_handler<F, Fut>(handler: F) -> EventHandler
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |args| Box::pin(handler(args)))
}

/// Registry of handlers keyed by event name
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<String, EventHandler>>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async closure for an event
    pub fn register<F, Fut>(&self, event: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.insert(event.into(), event_handler(handler))
    }

    /// Register an already boxed handler
    ///
    /// A later registration for the same event replaces the earlier one.
    /// Empty or whitespace-only event names are rejected.
    pub fn insert(&self, event: String, handler: EventHandler) -> Result<()> {
        if event.trim().is_empty() {
            return Err(Error::InvalidHandler {
                event,
                reason: "event name must not be empty".to_string(),
            });
        }
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| Error::Internal("handler registry poisoned".to_string()))?;
        if handlers.insert(event.clone(), handler).is_some() {
            tracing::debug!(event = %event, "Replaced event handler");
        }
        Ok(())
    }

    /// Run the handler registered for `event`, if any
    ///
    /// Returns false when no handler is registered.
    pub async fn dispatch(&self, event: &str, args: Vec<Value>) -> bool {
        // Clone out of the lock so the handler runs without holding it
        let handler = match self.handlers.read() {
            Ok(handlers) => handlers.get(event).cloned(),
            Err(_) => None,
        };

        match handler {
            Some(handler) => {
                handler(args).await;
                true
            }
            None => {
                tracing::trace!(event = %event, "No handler registered for event");
                false
            }
        }
    }

    /// Check if a handler is registered for an event
    pub fn has_handler(&self, event: &str) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(event))
            .unwrap_or(false)
    }

    /// Remove the handler for an event
    pub fn unregister(&self, event: &str) -> bool {
        self.handlers
            .write()
            .map(|mut handlers| handlers.remove(event).is_some())
            .unwrap_or(false)
    }

    /// Names of all events with a registered handler
    pub fn events(&self) -> Vec<String> {
        self.handlers
            .read()
            .map(|handlers| handlers.keys().cloned().collect())
            .unwrap_or_default()
    }
}
