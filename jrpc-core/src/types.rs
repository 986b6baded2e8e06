//! JSON-RPC 2.0 message model
//!
//! Typed structs for every message kind the protocol exchanges:
//!
//! 1. **Request**: a method call; one-way (a notification) when it has no id
//! 2. **Success / error responses**: the outcome of a request
//! 3. **Batches**: arrays of requests and the array of their responses
//!
//! Internal logic works on typed fields only. Messages are turned into a
//! `serde_json::Value` (see [`codec`](crate::codec)) at the serialization
//! boundary, and into text by the encoder they carry.
//!
//! # Request IDs
//!
//! A request id correlates a request with its response. Requests created by
//! [`JsonRpcProtocol`](crate::JsonRpcProtocol) get integer ids; requests parsed
//! from other peers may carry string ids. A missing or null id is represented
//! as `None` and marks the request as one-way.

use crate::codec::{self, default_encoder, SharedEncoder};
use crate::error::{Error, ErrorKind, JsonRpcError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// JSON-RPC 2.0 request ID
///
/// Serialized with `#[serde(untagged)]`, i.e. directly as a JSON number or
/// string. Null ids are modelled as `Option<Id>::None`. Numbers that are not
/// an `i64` (fractional, or past the `i64` range) are kept as received so a
/// reply echoes them unchanged.
///
/// # Examples
///
/// ```rust
/// use jrpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier, as allocated by the protocol's id counter
    Number(i64),
    /// Any other JSON number sent by a peer
    Numeric(Number),
    /// String identifier, accepted from peers that use them
    String(String),
}

impl Id {
    /// Read an id from a decoded JSON value
    ///
    /// Returns `Some(None)` for null, `Some(Some(id))` for numbers and
    /// strings, and `None` for anything a JSON-RPC id cannot be.
    pub(crate) fn from_value(value: &Value) -> Option<Option<Id>> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::Numeric(n) => write!(f, "{}", n),
            Id::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

/// Request parameters: positional (`args`) or named (`kwargs`)
///
/// A request holds at most one of the two, so they can never both be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Positional arguments, sent as a JSON array
    Positional(Vec<Value>),
    /// Named arguments, sent as a JSON object
    Named(Map<String, Value>),
}

impl Params {
    /// True when there are no arguments at all
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Positional(args) => args.is_empty(),
            Params::Named(kwargs) => kwargs.is_empty(),
        }
    }

    /// The wire representation of the parameters
    pub fn to_value(&self) -> Value {
        match self {
            Params::Positional(args) => Value::Array(args.clone()),
            Params::Named(kwargs) => Value::Object(kwargs.clone()),
        }
    }
}

/// JSON-RPC 2.0 request message
///
/// # Examples
///
/// ```rust
/// use jrpc_core::{Id, JsonRpcRequest, Params};
/// use serde_json::json;
///
/// let request = JsonRpcRequest::new(
///     "subtract",
///     Some(Params::Positional(vec![json!(42), json!(23)])),
///     Some(Id::Number(1)),
/// );
/// let reply = request.respond(19).unwrap();
/// assert_eq!(reply.unique_id, Some(Id::Number(1)));
/// ```
#[derive(Debug, Clone)]
pub struct JsonRpcRequest {
    /// Name of the remote method to invoke
    pub method: String,
    /// Positional or named parameters, if any
    pub params: Option<Params>,
    /// Correlation id; `None` for one-way requests
    pub unique_id: Option<Id>,
    encoder: SharedEncoder,
}

impl JsonRpcRequest {
    /// Create a request that serializes with the default encoder
    pub fn new(method: impl Into<String>, params: Option<Params>, unique_id: Option<Id>) -> Self {
        Self {
            method: method.into(),
            params,
            unique_id,
            encoder: default_encoder(),
        }
    }

    /// Replace the encoder used by this request and the responses it creates
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// The encoder this request carries
    pub fn encoder(&self) -> &SharedEncoder {
        &self.encoder
    }

    /// Positional arguments, if the request has them
    pub fn args(&self) -> Option<&[Value]> {
        match &self.params {
            Some(Params::Positional(args)) => Some(args),
            _ => None,
        }
    }

    /// Named arguments, if the request has them
    pub fn kwargs(&self) -> Option<&Map<String, Value>> {
        match &self.params {
            Some(Params::Named(kwargs)) => Some(kwargs),
            _ => None,
        }
    }

    /// True when no reply is expected
    pub fn is_one_way(&self) -> bool {
        self.unique_id.is_none()
    }

    /// Build the success response for this request
    ///
    /// Returns `None` for one-way requests: no reply is expected, which is
    /// not an error.
    pub fn respond(&self, result: impl Into<Value>) -> Option<JsonRpcSuccessResponse> {
        let unique_id = self.unique_id.clone()?;
        Some(
            JsonRpcSuccessResponse::new(Some(unique_id), result.into())
                .with_encoder(self.encoder.clone()),
        )
    }

    /// Build the error response for this request
    ///
    /// The error is resolved to a code and message with
    /// [`Error::code_and_message`]. One-way requests still resolve the error
    /// but return `None`.
    pub fn error_respond(&self, error: impl Into<Error>) -> Option<JsonRpcErrorResponse> {
        let (code, message) = error.into().code_and_message();
        match &self.unique_id {
            Some(id) => Some(
                JsonRpcErrorResponse::new(Some(id.clone()), code, message)
                    .with_encoder(self.encoder.clone()),
            ),
            None => {
                tracing::debug!(method = %self.method, code, "Dropping error response for one-way request");
                None
            }
        }
    }

    /// The canonical field mapping of this request
    pub fn to_value(&self) -> Value {
        codec::encode_request(self)
    }

    /// Serialize to JSON text with the request's encoder
    pub fn serialize(&self) -> Result<String> {
        self.encoder.encode(&self.to_value())
    }
}

/// Successful JSON-RPC 2.0 response
#[derive(Debug, Clone)]
pub struct JsonRpcSuccessResponse {
    /// Id of the request this answers
    pub unique_id: Option<Id>,
    /// The method's result
    pub result: Value,
    encoder: SharedEncoder,
}

impl JsonRpcSuccessResponse {
    /// Create a success response that serializes with the default encoder
    pub fn new(unique_id: Option<Id>, result: Value) -> Self {
        Self {
            unique_id,
            result,
            encoder: default_encoder(),
        }
    }

    /// Replace the encoder
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Deserialize the result into a typed value
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.result.clone())?)
    }

    /// The canonical field mapping of this response
    pub fn to_value(&self) -> Value {
        codec::encode_success(self)
    }

    /// Serialize to JSON text with the response's encoder
    pub fn serialize(&self) -> Result<String> {
        self.encoder.encode(&self.to_value())
    }
}

/// Error JSON-RPC 2.0 response
///
/// `unique_id` is `None` when the originating request could not be
/// correlated, e.g. the payload did not parse.
#[derive(Debug, Clone)]
pub struct JsonRpcErrorResponse {
    /// Id of the request this answers, if known
    pub unique_id: Option<Id>,
    /// Human-readable error message
    pub error: String,
    /// Numeric JSON-RPC error code
    pub code: i64,
    /// Optional additional error information
    pub data: Option<Value>,
    encoder: SharedEncoder,
}

impl JsonRpcErrorResponse {
    /// Create an error response that serializes with the default encoder
    pub fn new(unique_id: Option<Id>, code: i64, error: impl Into<String>) -> Self {
        Self {
            unique_id,
            error: error.into(),
            code,
            data: None,
            encoder: default_encoder(),
        }
    }

    /// Attach additional error data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Replace the encoder
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// The reserved error kind matching this response's code, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(self.code)
    }

    /// Turn the response into the error it reports
    pub fn into_error(self) -> Error {
        match self.kind() {
            Some(kind) => Error::JsonRpc(JsonRpcError::with_message(kind, self.error)),
            None => Error::Application {
                code: self.code,
                message: self.error,
            },
        }
    }

    /// The canonical field mapping of this response
    pub fn to_value(&self) -> Value {
        codec::encode_error(self)
    }

    /// Serialize to JSON text with the response's encoder
    pub fn serialize(&self) -> Result<String> {
        self.encoder.encode(&self.to_value())
    }
}

/// Any JSON-RPC 2.0 response
#[derive(Debug, Clone)]
pub enum JsonRpcResponse {
    /// The request succeeded
    Success(JsonRpcSuccessResponse),
    /// The request failed
    Error(JsonRpcErrorResponse),
}

impl JsonRpcResponse {
    /// Id of the request this answers
    pub fn unique_id(&self) -> Option<&Id> {
        match self {
            JsonRpcResponse::Success(r) => r.unique_id.as_ref(),
            JsonRpcResponse::Error(r) => r.unique_id.as_ref(),
        }
    }

    /// Check if the response represents a successful result
    pub fn is_success(&self) -> bool {
        matches!(self, JsonRpcResponse::Success(_))
    }

    /// Check if the response represents an error
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcResponse::Error(_))
    }

    /// The result on success, the reported error otherwise
    pub fn into_result(self) -> Result<Value> {
        match self {
            JsonRpcResponse::Success(r) => Ok(r.result),
            JsonRpcResponse::Error(r) => Err(r.into_error()),
        }
    }

    /// The canonical field mapping of this response
    pub fn to_value(&self) -> Value {
        match self {
            JsonRpcResponse::Success(r) => r.to_value(),
            JsonRpcResponse::Error(r) => r.to_value(),
        }
    }

    /// Serialize to JSON text with the response's encoder
    pub fn serialize(&self) -> Result<String> {
        match self {
            JsonRpcResponse::Success(r) => r.serialize(),
            JsonRpcResponse::Error(r) => r.serialize(),
        }
    }
}

impl From<JsonRpcSuccessResponse> for JsonRpcResponse {
    fn from(response: JsonRpcSuccessResponse) -> Self {
        JsonRpcResponse::Success(response)
    }
}

impl From<JsonRpcErrorResponse> for JsonRpcResponse {
    fn from(response: JsonRpcErrorResponse) -> Self {
        JsonRpcResponse::Error(response)
    }
}

/// One element of a batch request
///
/// A batch element that failed to parse is kept in place as an error, so one
/// malformed member does not invalidate the whole batch.
#[derive(Debug, Clone)]
pub enum BatchItem {
    /// A well-formed request
    Request(JsonRpcRequest),
    /// A sub-request that failed to parse
    Error(JsonRpcError),
}

impl BatchItem {
    /// The request, if this element parsed
    pub fn as_request(&self) -> Option<&JsonRpcRequest> {
        match self {
            BatchItem::Request(request) => Some(request),
            BatchItem::Error(_) => None,
        }
    }

    /// The error, if this element failed to parse
    pub fn as_error(&self) -> Option<&JsonRpcError> {
        match self {
            BatchItem::Request(_) => None,
            BatchItem::Error(error) => Some(error),
        }
    }

    /// True when this element needs a slot in the batch response
    pub fn expects_response(&self) -> bool {
        match self {
            BatchItem::Request(request) => !request.is_one_way(),
            BatchItem::Error(_) => true,
        }
    }

    /// The error response for an element that failed to parse
    ///
    /// Returns `None` for well-formed requests; those are answered with
    /// [`JsonRpcRequest::respond`] or [`JsonRpcRequest::error_respond`].
    pub fn error_respond(&self) -> Option<JsonRpcErrorResponse> {
        self.as_error().map(JsonRpcError::error_respond)
    }

    fn to_value(&self) -> Value {
        match self {
            BatchItem::Request(request) => request.to_value(),
            BatchItem::Error(error) => error.error_respond().to_value(),
        }
    }
}

impl From<JsonRpcRequest> for BatchItem {
    fn from(request: JsonRpcRequest) -> Self {
        BatchItem::Request(request)
    }
}

impl From<JsonRpcError> for BatchItem {
    fn from(error: JsonRpcError) -> Self {
        BatchItem::Error(error)
    }
}

/// JSON-RPC 2.0 batch request
///
/// An ordered list of [`BatchItem`]s. Construction does not validate; an
/// empty batch is rejected only when parsed from the wire.
#[derive(Debug, Clone)]
pub struct JsonRpcBatchRequest {
    items: Vec<BatchItem>,
    encoder: SharedEncoder,
}

impl JsonRpcBatchRequest {
    /// Create a batch that serializes with the default encoder
    pub fn new(items: Vec<BatchItem>) -> Self {
        Self {
            items,
            encoder: default_encoder(),
        }
    }

    /// Replace the encoder used by this batch and its batch response
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Append an element
    pub fn push(&mut self, item: impl Into<BatchItem>) {
        self.items.push(item.into());
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the batch has no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the elements in order
    pub fn iter(&self) -> std::slice::Iter<'_, BatchItem> {
        self.items.iter()
    }

    /// The elements in order
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// True when at least one element is an error or has an id
    pub fn expects_response(&self) -> bool {
        self.items.iter().any(BatchItem::expects_response)
    }

    /// Create the (empty) response collector for this batch
    ///
    /// Returns `None` when every element is one-way: such a batch gets no
    /// reply at all.
    pub fn create_batch_response(&self) -> Option<JsonRpcBatchResponse> {
        if self.expects_response() {
            Some(JsonRpcBatchResponse::new().with_encoder(self.encoder.clone()))
        } else {
            None
        }
    }

    /// The canonical array of element mappings
    pub fn to_value(&self) -> Value {
        Value::Array(self.items.iter().map(BatchItem::to_value).collect())
    }

    /// Serialize to JSON text with the batch's encoder
    pub fn serialize(&self) -> Result<String> {
        self.encoder.encode(&self.to_value())
    }
}

impl IntoIterator for JsonRpcBatchRequest {
    type Item = BatchItem;
    type IntoIter = std::vec::IntoIter<BatchItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a JsonRpcBatchRequest {
    type Item = &'a BatchItem;
    type IntoIter = std::slice::Iter<'a, BatchItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// JSON-RPC 2.0 batch response
///
/// Holds one slot per batch element in request order. Slots for one-way
/// requests are `None` and are dropped when serializing.
#[derive(Debug, Clone)]
pub struct JsonRpcBatchResponse {
    responses: Vec<Option<JsonRpcResponse>>,
    encoder: SharedEncoder,
}

impl JsonRpcBatchResponse {
    /// Create an empty batch response with the default encoder
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            encoder: default_encoder(),
        }
    }

    /// Replace the encoder
    pub fn with_encoder(mut self, encoder: SharedEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Append the response slot for the next batch element
    pub fn push(&mut self, response: Option<JsonRpcResponse>) {
        self.responses.push(response);
    }

    /// Number of slots, including empty ones
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Check if no slot was pushed
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Iterate over the responses that will be sent
    pub fn iter(&self) -> impl Iterator<Item = &JsonRpcResponse> {
        self.responses.iter().flatten()
    }

    /// The error responses in the batch
    pub fn errors(&self) -> Vec<&JsonRpcErrorResponse> {
        self.iter()
            .filter_map(|r| match r {
                JsonRpcResponse::Error(e) => Some(e),
                JsonRpcResponse::Success(_) => None,
            })
            .collect()
    }

    /// The canonical array of the present responses
    pub fn to_value(&self) -> Value {
        Value::Array(self.iter().map(JsonRpcResponse::to_value).collect())
    }

    /// Serialize to JSON text with the batch's encoder
    pub fn serialize(&self) -> Result<String> {
        self.encoder.encode(&self.to_value())
    }
}

impl Default for JsonRpcBatchResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(id: Option<i64>) -> JsonRpcRequest {
        JsonRpcRequest::new(
            "foo",
            Some(Params::Positional(vec![json!("bar")])),
            id.map(Id::Number),
        )
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(Id::from_value(&json!(null)), Some(None));
        assert_eq!(Id::from_value(&json!(7)), Some(Some(Id::Number(7))));
        assert_eq!(Id::from_value(&json!("a")), Some(Some(Id::from("a"))));
        assert_eq!(Id::from_value(&json!(true)), None);
        assert_eq!(
            Id::from_value(&json!(1.5)),
            Some(Some(Id::Numeric(Number::from_f64(1.5).unwrap())))
        );
        assert_eq!(
            Id::from_value(&json!(u64::MAX)),
            Some(Some(Id::Numeric(Number::from(u64::MAX))))
        );
        assert_eq!(Id::from_value(&json!([1])), None);
    }

    #[test]
    fn test_args_and_kwargs_views() {
        let positional = request(Some(1));
        assert_eq!(positional.args(), Some(&[json!("bar")][..]));
        assert!(positional.kwargs().is_none());

        let mut kwargs = Map::new();
        kwargs.insert("a".into(), json!("b"));
        let named = JsonRpcRequest::new("foo", Some(Params::Named(kwargs)), None);
        assert!(named.args().is_none());
        assert_eq!(named.kwargs().unwrap()["a"], "b");
    }

    #[test]
    fn test_respond_carries_id() {
        let response = request(Some(5)).respond(42).unwrap();
        assert_eq!(response.unique_id, Some(Id::Number(5)));
        assert_eq!(response.result, json!(42));
    }

    #[test]
    fn test_id_zero_still_gets_reply() {
        assert!(request(Some(0)).respond(json!(null)).is_some());
        assert!(request(Some(0)).error_respond("boom").is_some());
    }

    #[test]
    fn test_one_way_gets_no_response() {
        let one_way = request(None);
        assert!(one_way.is_one_way());
        assert!(one_way.respond(json!(null)).is_none());
        assert!(one_way.error_respond("boom").is_none());
    }

    #[test]
    fn test_error_respond_maps_error() {
        let req = request(Some(3));

        let server = req.error_respond("foo").unwrap();
        assert_eq!((server.code, server.error.as_str()), (-32000, "foo"));

        let not_found = req
            .error_respond(Error::MethodNotFound("foo".into()))
            .unwrap();
        assert_eq!(not_found.code, -32601);
        assert_eq!(not_found.error, "Method not found");

        let params = req.error_respond(JsonRpcError::invalid_params()).unwrap();
        assert_eq!(params.code, -32602);
        assert_eq!(params.unique_id, Some(Id::Number(3)));
    }

    #[test]
    fn test_result_as() {
        let response = JsonRpcSuccessResponse::new(Some(Id::Number(1)), json!([1, 2, 3]));
        let values: Vec<u32> = response.result_as().unwrap();
        assert_eq!(values, vec![1, 2, 3]);

        let mismatch: Result<String> = response.result_as();
        assert!(matches!(mismatch, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_into_result() {
        let ok: JsonRpcResponse = JsonRpcSuccessResponse::new(Some(Id::Number(1)), json!(42)).into();
        assert_eq!(ok.into_result().unwrap(), json!(42));

        let known: JsonRpcResponse =
            JsonRpcErrorResponse::new(Some(Id::Number(1)), -32601, "Method not found").into();
        match known.into_result() {
            Err(Error::JsonRpc(e)) => assert_eq!(e.kind(), ErrorKind::MethodNotFound),
            other => panic!("Expected JsonRpc error, got {:?}", other),
        }

        let custom: JsonRpcResponse =
            JsonRpcErrorResponse::new(Some(Id::Number(1)), 1001, "Insufficient funds").into();
        match custom.into_result() {
            Err(Error::Application { code, message }) => {
                assert_eq!(code, 1001);
                assert_eq!(message, "Insufficient funds");
            }
            other => panic!("Expected Application error, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_expects_response() {
        let one_way_only = JsonRpcBatchRequest::new(vec![request(None).into(), request(None).into()]);
        assert!(!one_way_only.expects_response());
        assert!(one_way_only.create_batch_response().is_none());

        let mixed = JsonRpcBatchRequest::new(vec![request(None).into(), request(Some(1)).into()]);
        assert!(mixed.create_batch_response().is_some());

        let with_error =
            JsonRpcBatchRequest::new(vec![request(None).into(), JsonRpcError::invalid_request().into()]);
        let response = with_error.create_batch_response().unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn test_batch_response_errors() {
        let mut batch = JsonRpcBatchResponse::new();
        batch.push(Some(JsonRpcSuccessResponse::new(Some(Id::Number(1)), json!(1)).into()));
        batch.push(None);
        batch.push(Some(JsonRpcError::invalid_request().error_respond().into()));

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.iter().count(), 2);
        assert_eq!(batch.errors().len(), 1);
        assert_eq!(batch.errors()[0].code, -32600);
    }
}
