//! Protocol metrics definitions
//!
//! OpenTelemetry instruments describing what the protocol facade does. They
//! are recorded only when a [`ProtocolMetrics`] is attached to the protocol
//! through its builder; without an installed meter provider the global meter
//! is a no-op.
//!
//! # Metrics Collected
//!
//! - **jrpc.requests.created**: outbound requests built (counter, `one_way`)
//! - **jrpc.requests.parsed**: inbound requests accepted (counter)
//! - **jrpc.replies.parsed**: replies accepted (counter, `status`)
//! - **jrpc.errors.total**: rejected input (counter, `kind`)
//! - **jrpc.batch.size**: elements per inbound batch (histogram)
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{JsonRpcProtocol, ProtocolMetrics};
//! use std::sync::Arc;
//!
//! let protocol = JsonRpcProtocol::builder()
//!     .metrics(Arc::new(ProtocolMetrics::new()))
//!     .build();
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::fmt;

/// Protocol metrics for monitoring
pub struct ProtocolMetrics {
    /// Total number of requests created
    pub requests_created: Counter<u64>,
    /// Total number of requests parsed
    pub requests_parsed: Counter<u64>,
    /// Total number of replies parsed
    pub replies_parsed: Counter<u64>,
    /// Total number of rejected messages
    pub errors_total: Counter<u64>,
    /// Batch size distribution
    pub batch_size: Histogram<u64>,
}

impl ProtocolMetrics {
    /// Create metrics on the global meter named "jrpc"
    pub fn new() -> Self {
        Self::with_meter(&global::meter("jrpc"))
    }

    /// Create metrics on a custom meter
    pub fn with_meter(meter: &Meter) -> Self {
        Self {
            requests_created: meter
                .u64_counter("jrpc.requests.created")
                .with_description("Total number of requests created")
                .build(),
            requests_parsed: meter
                .u64_counter("jrpc.requests.parsed")
                .with_description("Total number of requests parsed")
                .build(),
            replies_parsed: meter
                .u64_counter("jrpc.replies.parsed")
                .with_description("Total number of replies parsed")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.errors.total")
                .with_description("Total number of rejected messages")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.batch.size")
                .with_description("Number of elements in inbound batches")
                .build(),
        }
    }

    /// Record an outbound request
    pub fn record_request_created(&self, one_way: bool) {
        self.requests_created
            .add(1, &[KeyValue::new("one_way", one_way)]);
    }

    /// Record an accepted inbound request
    pub fn record_request_parsed(&self) {
        self.requests_parsed.add(1, &[]);
    }

    /// Record an accepted reply
    pub fn record_reply(&self, status: &'static str) {
        self.replies_parsed
            .add(1, &[KeyValue::new("status", status)]);
    }

    /// Record rejected input
    pub fn record_error(&self, kind: &'static str) {
        self.errors_total.add(1, &[KeyValue::new("kind", kind)]);
    }

    /// Record an inbound batch
    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }
}

impl fmt::Debug for ProtocolMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolMetrics").finish_non_exhaustive()
    }
}

impl Default for ProtocolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ProtocolMetrics::new();

        // Without a meter provider these are no-ops; they must not panic
        metrics.record_request_created(false);
        metrics.record_request_created(true);
        metrics.record_request_parsed();
        metrics.record_reply("success");
        metrics.record_error("parse_error");
        metrics.record_batch(5);
    }

    #[test]
    fn test_metrics_with_custom_meter() {
        let meter = global::meter("jrpc-test");
        let metrics = ProtocolMetrics::with_meter(&meter);

        metrics.record_reply("error");
        metrics.record_batch(0);
    }
}
