//! Error types for jrpc
//!
//! This module provides the error taxonomy of the JSON-RPC 2.0 protocol core.
//! It defines two layers:
//!
//! - **JsonRpcError**: a fixed-message protocol error bound to one of the
//!   reserved JSON-RPC error codes (see [`ErrorKind`])
//! - **Error**: the crate-wide error enum (uses thiserror) returned by every
//!   fallible operation
//!
//! # Standard Error Codes
//!
//! JSON-RPC 2.0 defines standard error codes:
//! - `-32700`: Parse error (invalid JSON)
//! - `-32600`: Invalid Request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000`: Server error (implementation-defined)
//!
//! # Resolving arbitrary errors
//!
//! When a request fails with an error that is not one of the fixed protocol
//! errors, [`Error::code_and_message`] decides what goes on the wire: an
//! explicit code wins, then invalid-request-like and method-not-found-like
//! errors map to their reserved codes, and everything else becomes a server
//! error that keeps the original message text.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{Error, ErrorKind, JsonRpcError};
//!
//! let error = JsonRpcError::method_not_found();
//! assert_eq!(error.code(), -32601);
//! assert_eq!(error.message(), "Method not found");
//!
//! let generic = Error::Server("disk full".into());
//! assert_eq!(generic.code_and_message(), (-32000, "disk full".to_string()));
//! # let _ = ErrorKind::ParseError;
//! ```

use crate::codec::{default_encoder, SharedEncoder};
use crate::types::JsonRpcErrorResponse;
use std::fmt;
use thiserror::Error;

/// Result type for jrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// The fixed set of JSON-RPC 2.0 error kinds
///
/// Each kind is bound to a literal error code and a canonical message. Neither
/// depends on runtime data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid JSON was received (-32700)
    ParseError,
    /// The JSON sent is not a valid Request object (-32600)
    InvalidRequest,
    /// The method does not exist / is not available (-32601)
    MethodNotFound,
    /// Invalid method parameter(s) (-32602)
    InvalidParams,
    /// Internal JSON-RPC error (-32603)
    InternalError,
    /// Implementation-defined server error (-32000); message is caller-supplied
    ServerError,
}

impl ErrorKind {
    /// Numeric JSON-RPC error code of this kind
    pub const fn code(self) -> i64 {
        match self {
            ErrorKind::ParseError => -32700,
            ErrorKind::InvalidRequest => -32600,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidParams => -32602,
            ErrorKind::InternalError => -32603,
            ErrorKind::ServerError => -32000,
        }
    }

    /// Canonical message of this kind
    pub const fn message(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "Parse error",
            ErrorKind::InvalidRequest => "Invalid Request",
            ErrorKind::MethodNotFound => "Method not found",
            ErrorKind::InvalidParams => "Invalid params",
            ErrorKind::InternalError => "Internal error",
            ErrorKind::ServerError => "",
        }
    }

    /// Look up the kind bound to a numeric code
    pub fn from_code(code: i64) -> Option<Self> {
        [
            ErrorKind::ParseError,
            ErrorKind::InvalidRequest,
            ErrorKind::MethodNotFound,
            ErrorKind::InvalidParams,
            ErrorKind::InternalError,
            ErrorKind::ServerError,
        ]
        .into_iter()
        .find(|kind| kind.code() == code)
    }
}

/// A fixed-message JSON-RPC protocol error
///
/// The code and default message come from the [`ErrorKind`]; an instance may
/// override the message (a server error usually does). Errors raised by a
/// [`JsonRpcProtocol`](crate::JsonRpcProtocol) carry the protocol's encoder so
/// that [`error_respond`](Self::error_respond) renders with it.
#[derive(Debug, Clone)]
pub struct JsonRpcError {
    kind: ErrorKind,
    message: Option<String>,
    encoder: Option<SharedEncoder>,
}

impl JsonRpcError {
    /// Create an error with the kind's canonical message
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            encoder: None,
        }
    }

    /// Create an error that overrides the kind's canonical message
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            encoder: None,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(ErrorKind::ParseError)
    }

    /// Invalid request error (-32600)
    pub fn invalid_request() -> Self {
        Self::new(ErrorKind::InvalidRequest)
    }

    /// Method not found error (-32601)
    pub fn method_not_found() -> Self {
        Self::new(ErrorKind::MethodNotFound)
    }

    /// Invalid params error (-32602)
    pub fn invalid_params() -> Self {
        Self::new(ErrorKind::InvalidParams)
    }

    /// Internal error (-32603)
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::InternalError)
    }

    /// Server error (-32000) with a caller-supplied message
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::ServerError, message)
    }

    /// Attach the encoder used when this error is turned into a response
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// The error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Numeric JSON-RPC error code
    pub fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Message text: the override if one was given, else the canonical one
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(self.kind.message())
    }

    /// Build an error response that is not correlated with any request
    ///
    /// The response id is always null: this is the reply for input whose id
    /// could not be determined (unparseable JSON, a malformed batch element).
    pub fn error_respond(&self) -> JsonRpcErrorResponse {
        let encoder = self.encoder.clone().unwrap_or_else(default_encoder);
        JsonRpcErrorResponse::new(None, self.code(), self.message()).with_encoder(encoder)
    }
}

impl PartialEq for JsonRpcError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message() == other.message()
    }
}

impl fmt::Display for JsonRpcError {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for JsonRpcError {}

impl From<ErrorKind> for JsonRpcError {
    fn from(kind: ErrorKind) -> Self {
        JsonRpcError::new(kind)
    }
}

/// Application-level error type for jrpc operations
///
/// # Error Categories
///
/// - **Protocol errors**: `JsonRpc` (fixed-code), `InvalidRequest`, `MethodNotFound`
/// - **Reply errors**: `InvalidReply`, raised while parsing a response
/// - **Processing errors**: `Serialization`
/// - **Dispatch errors**: `Application` (explicit code) and `Server` (anything else),
///   typically produced by user code and turned into error responses
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Fixed-code JSON-RPC protocol error
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    /// Structurally invalid request detected outside the wire codec
    /// (e.g. positional and named arguments given together)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A dispatcher could not find the requested method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Malformed or non-conforming reply payload
    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Application error carrying an explicit JSON-RPC code
    #[error("{message}")]
    Application {
        /// Error code put on the wire
        code: i64,
        /// Error message put on the wire
        message: String,
    },

    /// Any other error; surfaces as a server error with this message
    #[error("{0}")]
    Server(String),
}

impl Error {
    /// Resolve the code and message an error response should carry
    ///
    /// Precedence: explicit code, then invalid-request-like, then
    /// method-not-found-like, then server error with the original text.
    pub fn code_and_message(&self) -> (i64, String) {
        match self {
            Error::JsonRpc(e) => (e.code(), e.message().to_string()),
            Error::Application { code, message } => (*code, message.clone()),
            Error::InvalidRequest(_) => fixed(ErrorKind::InvalidRequest),
            Error::MethodNotFound(_) => fixed(ErrorKind::MethodNotFound),
            other => (ErrorKind::ServerError.code(), other.to_string()),
        }
    }

    /// Convert into the error object stored inline in a batch
    ///
    /// Protocol errors are kept as they are; anything else becomes a generic
    /// invalid request.
    pub(crate) fn into_protocol_error(self) -> JsonRpcError {
        match self {
            Error::JsonRpc(e) => e,
            _ => JsonRpcError::invalid_request(),
        }
    }
}

fn fixed(kind: ErrorKind) -> (i64, String) {
    (kind.code(), kind.message().to_string())
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Server(message)
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Server(message.to_string())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::JsonRpc(JsonRpcError::new(kind))
    }
}
