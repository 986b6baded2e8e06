//! Builder for configuring a JSON-RPC protocol instance
//!
//! The builder provides a fluent API for creating a `JsonRpcProtocol`. It
//! allows you to:
//! - Plug in a value encoder
//! - Limit the size of inbound batches
//! - Attach OpenTelemetry metrics
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{JsonRpcProtocol, PrettyEncoder};
//!
//! let protocol = JsonRpcProtocol::builder()
//!     .encoder(PrettyEncoder)
//!     .max_batch_size(100)
//!     .build();
//! ```

use crate::codec::{default_encoder, Encoder, SharedEncoder};
use crate::metrics::ProtocolMetrics;
use crate::protocol::JsonRpcProtocol;
use std::sync::Arc;

/// Builder for constructing a [`JsonRpcProtocol`]
#[derive(Debug, Default)]
pub struct ProtocolBuilder {
    encoder: Option<SharedEncoder>,
    max_batch_size: Option<usize>,
    metrics: Option<Arc<ProtocolMetrics>>,
}

impl ProtocolBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the encoder every message created by the protocol will use
    pub fn encoder<E: Encoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Set an encoder that is already shared with other components
    pub fn shared_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Set the maximum number of elements accepted in an inbound batch
    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    /// Record protocol activity on the given metrics
    pub fn metrics(mut self, metrics: Arc<ProtocolMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the protocol
    pub fn build(self) -> JsonRpcProtocol {
        JsonRpcProtocol::from_parts(
            self.encoder.unwrap_or_else(default_encoder),
            self.max_batch_size,
            self.metrics,
        )
    }
}
