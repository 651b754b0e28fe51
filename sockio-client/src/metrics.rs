//! Client metrics definitions
//!
//! OpenTelemetry instruments describing the connection lifecycle. They are
//! created from the global meter provider, so they export wherever
//! `sockio_core::init_observability` pointed it, and are no-ops otherwise.
//!
//! # Metrics Collected
//!
//! - **connection_state**: Current lifecycle state (gauge)
//! - **dial_failures**: Failed dial attempts (counter)
//! - **disconnects**: Unexpected connection losses (counter)
//! - **reconnection_attempts**: Redial attempts by the supervisor (counter)
//! - **reconnection_success**: Successful redials (counter)

use crate::ConnectionState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Lifecycle state, see [`ConnectionState::metric_code`]
    pub connection_state: Gauge<i64>,
    /// Total number of failed dials
    pub dial_failures: Counter<u64>,
    /// Total number of unexpected disconnects
    pub disconnects: Counter<u64>,
    /// Total number of redial attempts
    pub reconnection_attempts: Counter<u64>,
    /// Total number of successful redials
    pub reconnection_success: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("sockio.client.connection.state")
                .with_description(
                    "Connection state (0=disconnected, 1=connected, 2=reconnecting, 3=closed)",
                )
                .build(),
            dial_failures: meter
                .u64_counter("sockio.client.dial.failures")
                .with_description("Total number of failed dial attempts")
                .build(),
            disconnects: meter
                .u64_counter("sockio.client.disconnects")
                .with_description("Total number of unexpected disconnects")
                .build(),
            reconnection_attempts: meter
                .u64_counter("sockio.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("sockio.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
        }
    }

    /// Record the current lifecycle state
    pub fn update_connection_state(&self, state: ConnectionState) {
        self.connection_state.record(state.metric_code(), &[]);
    }

    /// Record a failed dial
    pub fn record_dial_failure(&self, error: &sockio_core::Error) {
        let kind = if error.is_transport() { "transport" } else { "other" };
        self.dial_failures
            .add(1, &[KeyValue::new("error_type", kind.to_string())]);
    }

    /// Record an unexpected disconnect
    pub fn record_disconnect(&self) {
        self.disconnects.add(1, &[]);
    }

    /// Record a redial attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful redial
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        // Without a meter provider the instruments are no-ops
        metrics.update_connection_state(ConnectionState::Connected);
        metrics.record_dial_failure(&sockio_core::Error::WebSocket("refused".into()));
        metrics.record_disconnect();
        metrics.record_reconnection_attempt();
        metrics.record_reconnection_success();
    }

    #[test]
    fn test_all_states_recordable() {
        let metrics = ClientMetrics::new("test-client-state");
        metrics.update_connection_state(ConnectionState::Disconnected);
        metrics.update_connection_state(ConnectionState::Reconnecting { attempt: 3 });
        metrics.update_connection_state(ConnectionState::Closed);
    }

    #[test]
    fn test_metrics_with_sdk_meter() {
        use opentelemetry::metrics::MeterProvider as _;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder().build();
        let meter = provider.meter("sockio-test");
        let metrics = ClientMetrics::new_with_meter(&meter);
        metrics.update_connection_state(ConnectionState::Connected);
        metrics.record_reconnection_attempt();
        metrics.record_reconnection_success();
    }
}
