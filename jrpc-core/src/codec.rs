//! Codec for JSON-RPC message serialization and deserialization
//!
//! This module converts typed messages to their canonical field mapping
//! (a `serde_json::Value`) and back, and hosts the pluggable [`Encoder`] that
//! turns a mapping into JSON text.
//!
//! # Why a Codec Module?
//!
//! serde could map the structs directly, but the wire rules are stricter than
//! what derive gives us:
//! - **Exact key sets**: unknown top-level keys are rejected, never ignored
//! - **Presence rules**: `id` must be present in replies even when null, and
//!   exactly one of `result`/`error` must be there
//! - **Error mapping**: each violation maps to a specific protocol error
//!
//! # Error Handling
//!
//! - Request validation failures → `Error::JsonRpc` (-32600 / -32602)
//! - Reply validation failures → `Error::InvalidReply`
//! - Encoding failures → `Error::Serialization`
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{codec, Id, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("ping", None, Some(Id::Number(1)));
//! let mapping = codec::encode_request(&request);
//! assert_eq!(mapping["jsonrpc"], "2.0");
//! assert!(mapping.get("params").is_none());
//! ```

use crate::error::{Error, JsonRpcError, Result};
use crate::types::{
    Id, JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse, JsonRpcSuccessResponse, Params,
};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// The only protocol version this codec speaks
pub const JSON_RPC_VERSION: &str = "2.0";

/// Top-level keys a request object may contain
pub const ALLOWED_REQUEST_KEYS: [&str; 4] = ["id", "jsonrpc", "method", "params"];

/// Top-level keys a reply object may contain
pub const ALLOWED_REPLY_KEYS: [&str; 4] = ["error", "id", "jsonrpc", "result"];

/// Renders a canonical message mapping to JSON text
///
/// This is the hook for controlling how domain-specific values (timestamps,
/// decimals, ...) appear on the wire. A protocol's encoder is carried by every
/// message it creates, so one choice applies to requests, batches and error
/// responses alike.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::codec::Encoder;
/// use jrpc_core::Result;
/// use serde_json::Value;
///
/// #[derive(Debug)]
/// struct Uppercase;
///
/// impl Encoder for Uppercase {
///     fn encode(&self, value: &Value) -> Result<String> {
///         Ok(serde_json::to_string(value)?.to_uppercase())
///     }
/// }
/// ```
pub trait Encoder: fmt::Debug + Send + Sync {
    /// Render `value` as JSON text
    fn encode(&self, value: &Value) -> Result<String>;
}

/// Shared handle to an encoder
pub type SharedEncoder = Arc<dyn Encoder>;

/// Compact JSON output (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }
}

/// Indented JSON output, handy for logs and debugging
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyEncoder;

impl Encoder for PrettyEncoder {
    fn encode(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

/// A fresh handle to the default encoder
pub fn default_encoder() -> SharedEncoder {
    Arc::new(JsonEncoder)
}

/// Canonical mapping of a request
///
/// `params` is left out when there are no arguments; `id` is left out for
/// one-way requests.
pub fn encode_request(request: &JsonRpcRequest) -> Value {
    let mut map = envelope();
    map.insert("method".into(), Value::String(request.method.clone()));
    if let Some(params) = request.params.as_ref().filter(|p| !p.is_empty()) {
        map.insert("params".into(), params.to_value());
    }
    if let Some(id) = &request.unique_id {
        map.insert("id".into(), id_value(Some(id)));
    }
    Value::Object(map)
}

/// Canonical mapping of a success response
pub fn encode_success(response: &JsonRpcSuccessResponse) -> Value {
    let mut map = envelope();
    map.insert("id".into(), id_value(response.unique_id.as_ref()));
    map.insert("result".into(), response.result.clone());
    Value::Object(map)
}

/// Canonical mapping of an error response
pub fn encode_error(response: &JsonRpcErrorResponse) -> Value {
    let mut error = Map::new();
    error.insert("message".into(), Value::String(response.error.clone()));
    error.insert("code".into(), Value::from(response.code));
    if let Some(data) = &response.data {
        error.insert("data".into(), data.clone());
    }

    let mut map = envelope();
    map.insert("id".into(), id_value(response.unique_id.as_ref()));
    map.insert("error".into(), Value::Object(error));
    Value::Object(map)
}

fn envelope() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("jsonrpc".into(), Value::String(JSON_RPC_VERSION.into()));
    map
}

fn id_value(id: Option<&Id>) -> Value {
    json!(id)
}

/// Decode JSON text into a generic value
pub fn decode(data: &str) -> Result<Value> {
    Ok(serde_json::from_str(data)?)
}

/// The first key of `map` that is not in `allowed`
fn disallowed_key<'a>(map: &'a Map<String, Value>, allowed: &[&str]) -> Option<&'a str> {
    map.keys()
        .map(String::as_str)
        .find(|key| !allowed.contains(key))
}

/// Validate a decoded request object and build the request
///
/// Checks, in order: allowed keys, `jsonrpc == "2.0"`, `method` is a
/// non-blank string, `params` is an array or object, `id` is an integer,
/// string or null. A missing `id` marks the request as one-way.
pub fn decode_request(value: Value, encoder: &SharedEncoder) -> Result<JsonRpcRequest> {
    let invalid = || Error::JsonRpc(JsonRpcError::invalid_request().with_encoder(encoder.clone()));

    let Value::Object(mut req) = value else {
        tracing::debug!("Request is not a JSON object");
        return Err(invalid());
    };

    if let Some(key) = disallowed_key(&req, &ALLOWED_REQUEST_KEYS) {
        tracing::debug!(key, "Request contains a key that is not allowed");
        return Err(invalid());
    }

    if req.get("jsonrpc").and_then(Value::as_str) != Some(JSON_RPC_VERSION) {
        return Err(invalid());
    }

    let method = match req.remove("method") {
        Some(Value::String(method)) if !method.trim().is_empty() => method,
        _ => return Err(invalid()),
    };

    let params = match req.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Array(args)) => Some(Params::Positional(args)),
        Some(Value::Object(kwargs)) => Some(Params::Named(kwargs)),
        Some(_) => {
            return Err(Error::JsonRpc(
                JsonRpcError::invalid_params().with_encoder(encoder.clone()),
            ))
        }
    };

    let unique_id = match req.remove("id") {
        None => None,
        Some(id) => Id::from_value(&id).ok_or_else(invalid)?,
    };

    Ok(JsonRpcRequest::new(method, params, unique_id).with_encoder(encoder.clone()))
}

/// Validate a decoded reply object and build the response
///
/// Checks, in order: allowed keys, `jsonrpc == "2.0"`, `id` present,
/// exactly one of `result` and `error`, then the shape of the branch taken.
/// Every failure is an [`Error::InvalidReply`].
pub fn decode_reply(value: Value, encoder: &SharedEncoder) -> Result<JsonRpcResponse> {
    let Value::Object(mut rep) = value else {
        return Err(Error::InvalidReply("Reply must be a JSON object".into()));
    };

    if let Some(key) = disallowed_key(&rep, &ALLOWED_REPLY_KEYS) {
        return Err(Error::InvalidReply(format!("Key not allowed: {}", key)));
    }

    match rep.get("jsonrpc") {
        None => {
            return Err(Error::InvalidReply(
                "Missing jsonrpc (version) in response".into(),
            ))
        }
        Some(version) if version.as_str() != Some(JSON_RPC_VERSION) => {
            return Err(Error::InvalidReply("Wrong JSONRPC version".into()))
        }
        Some(_) => {}
    }

    let id = rep
        .remove("id")
        .ok_or_else(|| Error::InvalidReply("Missing id in response".into()))?;

    let response = match (rep.remove("result"), rep.remove("error")) {
        (Some(result), None) => JsonRpcSuccessResponse::new(None, result)
            .with_encoder(encoder.clone())
            .into(),
        (None, Some(error)) => decode_error_object(error)?
            .with_encoder(encoder.clone())
            .into(),
        _ => {
            return Err(Error::InvalidReply(
                "Reply must contain exactly one of result and error".into(),
            ))
        }
    };

    let unique_id = Id::from_value(&id)
        .ok_or_else(|| Error::InvalidReply(format!("Invalid id in response: {}", id)))?;

    Ok(with_id(response, unique_id))
}

fn decode_error_object(error: Value) -> Result<JsonRpcErrorResponse> {
    let Value::Object(mut error) = error else {
        return Err(Error::InvalidReply("Error member must be an object".into()));
    };

    let message = match error.remove("message") {
        Some(Value::String(message)) => message,
        _ => return Err(Error::InvalidReply("Error message must be a string".into())),
    };
    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::InvalidReply("Error code must be an integer".into()))?;

    let response = JsonRpcErrorResponse::new(None, code, message);
    Ok(match error.remove("data") {
        Some(data) => response.with_data(data),
        None => response,
    })
}

fn with_id(response: JsonRpcResponse, unique_id: Option<Id>) -> JsonRpcResponse {
    match response {
        JsonRpcResponse::Success(mut r) => {
            r.unique_id = unique_id;
            r.into()
        }
        JsonRpcResponse::Error(mut r) => {
            r.unique_id = unique_id;
            r.into()
        }
    }
}
