//! JRPC - transport-agnostic JSON-RPC 2.0
//!
//! This is the convenience crate that re-exports the protocol core. Use it
//! if you want a single dependency; transports and dispatchers only need the
//! types below.
//!
//! # Architecture
//!
//! - **jrpc-core**: messages, codec, protocol facade, error handling, logging
//!
//! # Quick Start - Client
//!
//! ```rust
//! use jrpc::{JsonRpcProtocol, JsonRpcResponse};
//! use serde_json::json;
//!
//! let protocol = JsonRpcProtocol::new();
//! let request = protocol
//!     .create_request("add", Some(vec![json!(5), json!(3)]), None, false)
//!     .unwrap();
//! let wire = request.serialize().unwrap();
//! # let _ = wire;
//!
//! // ... ship `wire`, receive the reply text ...
//! let reply = protocol
//!     .parse_reply(r#"{"jsonrpc":"2.0","id":1,"result":8}"#)
//!     .unwrap();
//! assert!(matches!(reply, JsonRpcResponse::Success(_)));
//! ```
//!
//! # Quick Start - Server
//!
//! ```rust
//! use jrpc::{Error, JsonRpcProtocol, RequestMessage};
//!
//! let protocol = JsonRpcProtocol::new();
//! let data = r#"{"jsonrpc":"2.0","method":"nope","id":7}"#;
//!
//! let reply = match protocol.parse_request(data) {
//!     Ok(RequestMessage::Single(request)) => request
//!         .error_respond(Error::MethodNotFound(request.method.clone()))
//!         .map(|r| r.serialize().unwrap()),
//!     Ok(RequestMessage::Batch(_)) => None,
//!     Err(Error::JsonRpc(e)) => Some(e.error_respond().serialize().unwrap()),
//!     Err(e) => panic!("{}", e),
//! };
//! assert!(reply.unwrap().contains("-32601"));
//! ```

pub use jrpc_core as core;

pub use jrpc_core::{
    init_logging, BatchItem, Encoder, Error, ErrorKind, Id, JsonEncoder, JsonRpcBatchRequest,
    JsonRpcBatchResponse, JsonRpcError, JsonRpcErrorResponse, JsonRpcProtocol, JsonRpcRequest,
    JsonRpcResponse, JsonRpcSuccessResponse, LogConfig, LogFormat, Params, PrettyEncoder,
    ProtocolBuilder, ProtocolMetrics, RequestMessage, Result, RpcBatchProtocol, RpcProtocol,
    SharedEncoder,
};
