//! Core JSON-RPC 2.0 protocol for jrpc
//!
//! This crate implements the message layer of JSON-RPC 2.0 and nothing else.
//! It includes:
//!
//! - **Types**: requests, success and error replies, batches
//! - **Codec**: wire validation and the pluggable value [`Encoder`]
//! - **Protocol**: [`JsonRpcProtocol`], the facade that creates and parses messages
//! - **Error handling**: the standard error codes and the crate [`Error`]
//! - **Observability**: `tracing` logging setup and OpenTelemetry metrics
//!
//! # Architecture
//!
//! The crate is transport-agnostic. A transport moves text; a dispatcher maps
//! method names to functions. Both sit on top of this crate and talk to it
//! through [`JsonRpcProtocol`] (or the [`RpcProtocol`] trait).
//!
//! # Example
//!
//! ```rust
//! use jrpc_core::{JsonRpcProtocol, RequestMessage};
//! use serde_json::json;
//!
//! let protocol = JsonRpcProtocol::new();
//!
//! let request = protocol
//!     .create_request("foo", Some(vec![json!("bar")]), None, false)
//!     .unwrap();
//! let wire = request.serialize().unwrap();
//!
//! let RequestMessage::Single(parsed) = protocol.parse_request(&wire).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(parsed.method, "foo");
//! assert_eq!(parsed.args().unwrap(), &[json!("bar")]);
//! ```

pub mod builder;
pub mod codec;
pub mod error;
pub mod metrics;
pub mod observability;
pub mod protocol;
pub mod types;

// Re-export the most commonly used types for convenience
pub use builder::ProtocolBuilder;
pub use codec::{Encoder, JsonEncoder, PrettyEncoder, SharedEncoder};
pub use error::{Error, ErrorKind, JsonRpcError, Result};
pub use metrics::ProtocolMetrics;
pub use observability::{init_logging, LogConfig, LogFormat};
pub use protocol::{JsonRpcProtocol, RequestMessage, RpcBatchProtocol, RpcProtocol};
pub use types::{
    BatchItem, Id, JsonRpcBatchRequest, JsonRpcBatchResponse, JsonRpcErrorResponse,
    JsonRpcRequest, JsonRpcResponse, JsonRpcSuccessResponse, Params,
};
