//! JSON-RPC 2.0 protocol facade
//!
//! [`JsonRpcProtocol`] is the single entry point for transports and
//! dispatchers. It allocates request ids, builds outbound requests and
//! batches, and parses inbound requests and replies.
//!
//! # Request Lifecycle
//!
//! 1. **Create**: `create_request` validates the arguments and assigns an id
//!    (none for one-way requests)
//! 2. **Send**: the caller serializes the request and ships the text
//! 3. **Dispatch**: the peer runs `parse_request`, invokes the method and
//!    answers with `respond` / `error_respond`
//! 4. **Reply**: the caller runs `parse_reply` on the text it receives
//!
//! # Batches
//!
//! `parse_request` accepts a JSON array. Each element is parsed on its own;
//! an element that fails is stored in place as an error so the rest of the
//! batch still gets processed. An empty array fails the whole call.
//!
//! # Thread Safety
//!
//! The only mutable state is the id counter, an `AtomicU64`. A protocol can be
//! shared (e.g. behind an `Arc`) by any number of request producers; every
//! `create_request` call observes a distinct id.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_core::{JsonRpcProtocol, JsonRpcResponse, RequestMessage};
//! use serde_json::json;
//!
//! let protocol = JsonRpcProtocol::new();
//!
//! // Client side
//! let request = protocol
//!     .create_request("add", Some(vec![json!(5), json!(3)]), None, false)
//!     .unwrap();
//! let wire = request.serialize().unwrap();
//!
//! // Server side
//! let RequestMessage::Single(incoming) = protocol.parse_request(&wire).unwrap() else {
//!     panic!("not a batch");
//! };
//! let reply = incoming.respond(8).unwrap().serialize().unwrap();
//!
//! // Back on the client
//! match protocol.parse_reply(&reply).unwrap() {
//!     JsonRpcResponse::Success(r) => assert_eq!(r.result, json!(8)),
//!     JsonRpcResponse::Error(e) => panic!("{}", e.error),
//! }
//! ```

use crate::builder::ProtocolBuilder;
use crate::codec::{self, SharedEncoder};
use crate::error::{Error, ErrorKind, JsonRpcError, Result};
use crate::metrics::ProtocolMetrics;
use crate::types::{Id, JsonRpcBatchRequest, JsonRpcRequest, JsonRpcResponse, Params};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Contract of an RPC protocol: build requests, parse requests and replies
///
/// Transports and dispatchers can be written against this trait instead of a
/// concrete protocol.
pub trait RpcProtocol {
    /// Outbound request type
    type Request;
    /// Parsed reply type
    type Response;
    /// Parsed inbound payload (a request, or a batch for batch protocols)
    type Incoming;

    /// Build an outbound request
    fn create_request(
        &self,
        method: &str,
        args: Option<Vec<Value>>,
        kwargs: Option<Map<String, Value>>,
        one_way: bool,
    ) -> Result<Self::Request>;

    /// Parse an inbound request payload
    fn parse_request(&self, data: &str) -> Result<Self::Incoming>;

    /// Parse a reply payload
    fn parse_reply(&self, data: &str) -> Result<Self::Response>;

    /// Whether requests can be sent without expecting a reply
    fn supports_one_way(&self) -> bool {
        true
    }
}

/// An [`RpcProtocol`] that can group requests into batches
pub trait RpcBatchProtocol: RpcProtocol {
    /// Outbound batch type
    type BatchRequest;

    /// Wrap requests into a batch
    fn create_batch_request(&self, requests: Option<Vec<Self::Request>>) -> Self::BatchRequest;
}

/// A parsed inbound payload
#[derive(Debug, Clone)]
pub enum RequestMessage {
    /// A single request object
    Single(JsonRpcRequest),
    /// A JSON array of requests
    Batch(JsonRpcBatchRequest),
}

impl RequestMessage {
    /// Check if the payload was a batch
    pub fn is_batch(&self) -> bool {
        matches!(self, RequestMessage::Batch(_))
    }

    /// The single request, if the payload was not a batch
    pub fn into_single(self) -> Option<JsonRpcRequest> {
        match self {
            RequestMessage::Single(request) => Some(request),
            RequestMessage::Batch(_) => None,
        }
    }

    /// The batch, if the payload was one
    pub fn into_batch(self) -> Option<JsonRpcBatchRequest> {
        match self {
            RequestMessage::Single(_) => None,
            RequestMessage::Batch(batch) => Some(batch),
        }
    }
}

/// JSON-RPC 2.0 protocol implementation
///
/// Only version 2.0 is supported.
#[derive(Debug)]
pub struct JsonRpcProtocol {
    id_counter: AtomicU64,
    encoder: SharedEncoder,
    max_batch_size: Option<usize>,
    metrics: Option<Arc<ProtocolMetrics>>,
}

impl JsonRpcProtocol {
    /// Create a protocol with the default encoder and no batch limit
    pub fn new() -> Self {
        ProtocolBuilder::new().build()
    }

    /// Start configuring a protocol
    pub fn builder() -> ProtocolBuilder {
        ProtocolBuilder::new()
    }

    pub(crate) fn from_parts(
        encoder: SharedEncoder,
        max_batch_size: Option<usize>,
        metrics: Option<Arc<ProtocolMetrics>>,
    ) -> Self {
        Self {
            id_counter: AtomicU64::new(0),
            encoder,
            max_batch_size,
            metrics,
        }
    }

    /// The encoder threaded into every message this protocol creates
    pub fn encoder(&self) -> &SharedEncoder {
        &self.encoder
    }

    /// The inbound batch size limit, if any
    pub fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }

    /// Allocate the next request id; the first id is 1
    fn next_id(&self) -> Id {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Id::Number(id as i64)
    }

    /// Build an outbound request
    ///
    /// Empty `args` / `kwargs` count as absent. Giving both fails with
    /// [`Error::InvalidRequest`]. A fresh id is allocated unless `one_way`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jrpc_core::{Error, JsonRpcProtocol};
    /// use serde_json::{json, Map};
    ///
    /// let protocol = JsonRpcProtocol::new();
    ///
    /// let notify = protocol.create_request("log", Some(vec![json!("hi")]), None, true).unwrap();
    /// assert!(notify.unique_id.is_none());
    ///
    /// let mut kwargs = Map::new();
    /// kwargs.insert("x".into(), json!(1));
    /// let conflict = protocol.create_request("foo", Some(vec![json!("a")]), Some(kwargs), false);
    /// assert!(matches!(conflict, Err(Error::InvalidRequest(_))));
    /// ```
    pub fn create_request(
        &self,
        method: impl Into<String>,
        args: Option<Vec<Value>>,
        kwargs: Option<Map<String, Value>>,
        one_way: bool,
    ) -> Result<JsonRpcRequest> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(Error::InvalidRequest("Method name must not be blank".into()));
        }

        let params = match (
            args.filter(|a| !a.is_empty()),
            kwargs.filter(|k| !k.is_empty()),
        ) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidRequest(
                    "Does not support args and kwargs at the same time".into(),
                ))
            }
            (Some(args), None) => Some(Params::Positional(args)),
            (None, Some(kwargs)) => Some(Params::Named(kwargs)),
            (None, None) => None,
        };

        let unique_id = if one_way { None } else { Some(self.next_id()) };
        tracing::debug!(method = %method, id = ?unique_id, "Request created");
        if let Some(ref m) = self.metrics {
            m.record_request_created(one_way);
        }

        Ok(JsonRpcRequest::new(method, params, unique_id).with_encoder(self.encoder.clone()))
    }

    /// Wrap requests into a batch (an empty one by default)
    ///
    /// No validation happens here; an empty batch is only rejected when it
    /// is parsed from the wire.
    pub fn create_batch_request(&self, requests: Option<Vec<JsonRpcRequest>>) -> JsonRpcBatchRequest {
        let items = requests
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect();
        JsonRpcBatchRequest::new(items).with_encoder(self.encoder.clone())
    }

    /// Parse an inbound request or batch
    ///
    /// # Errors
    ///
    /// - ParseError (-32700) if `data` is not valid JSON
    /// - InvalidRequest (-32600) for a malformed single request, an empty
    ///   batch, or a batch over the configured size limit
    /// - InvalidParams (-32602) for a single request whose params are neither
    ///   an array nor an object
    ///
    /// Malformed batch elements do not fail the call; they are kept in the
    /// batch as errors.
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    pub fn parse_request(&self, data: &str) -> Result<RequestMessage> {
        let value = codec::decode(data).map_err(|e| {
            tracing::debug!(error = %e, "Request is not valid JSON");
            self.rejected(self.protocol_error(JsonRpcError::parse_error()))
        })?;

        match value {
            Value::Array(elements) => self.parse_batch(elements).map(RequestMessage::Batch),
            single => {
                let request = codec::decode_request(single, &self.encoder)
                    .map_err(|e| self.rejected(e))?;
                if let Some(ref m) = self.metrics {
                    m.record_request_parsed();
                }
                Ok(RequestMessage::Single(request))
            }
        }
    }

    fn parse_batch(&self, elements: Vec<Value>) -> Result<JsonRpcBatchRequest> {
        if elements.is_empty() {
            return Err(self.rejected(self.protocol_error(JsonRpcError::invalid_request())));
        }

        if let Some(limit) = self.max_batch_size {
            if elements.len() > limit {
                let error = JsonRpcError::with_message(
                    ErrorKind::InvalidRequest,
                    format!(
                        "Batch size limit exceeded: limit={}, actual={}",
                        limit,
                        elements.len()
                    ),
                );
                return Err(self.rejected(self.protocol_error(error)));
            }
        }

        if let Some(ref m) = self.metrics {
            m.record_batch(elements.len() as u64);
        }

        let mut batch =
            JsonRpcBatchRequest::new(Vec::with_capacity(elements.len())).with_encoder(self.encoder.clone());
        for (index, element) in elements.into_iter().enumerate() {
            match codec::decode_request(element, &self.encoder) {
                Ok(request) => {
                    if let Some(ref m) = self.metrics {
                        m.record_request_parsed();
                    }
                    batch.push(request);
                }
                Err(e) => {
                    tracing::debug!(index, error = %e, "Batch element rejected");
                    let e = self.rejected(e);
                    batch.push(e.into_protocol_error().with_encoder(self.encoder.clone()));
                }
            }
        }

        tracing::debug!(batch_size = batch.len(), "Batch parsed");
        Ok(batch)
    }

    /// Parse a reply to one of our requests
    ///
    /// Every failure is reported as [`Error::InvalidReply`].
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    pub fn parse_reply(&self, data: &str) -> Result<JsonRpcResponse> {
        let value = codec::decode(data)
            .map_err(|e| self.rejected(Error::InvalidReply(e.to_string())))?;
        let reply = codec::decode_reply(value, &self.encoder).map_err(|e| self.rejected(e))?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Parse a JSON array of replies to a batch we sent
    ///
    /// Every element is validated like [`parse_reply`](Self::parse_reply);
    /// the first invalid element fails the call. A non-array or empty array
    /// is an [`Error::InvalidReply`].
    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    pub fn parse_batch_reply(&self, data: &str) -> Result<Vec<JsonRpcResponse>> {
        let value = codec::decode(data)
            .map_err(|e| self.rejected(Error::InvalidReply(e.to_string())))?;

        let replies = match value {
            Value::Array(replies) if !replies.is_empty() => replies,
            Value::Array(_) => {
                return Err(self.rejected(Error::InvalidReply("Batch reply is empty".into())))
            }
            _ => {
                return Err(self.rejected(Error::InvalidReply(
                    "Batch reply must be a JSON array".into(),
                )))
            }
        };

        replies
            .into_iter()
            .map(|reply| {
                let reply = codec::decode_reply(reply, &self.encoder).map_err(|e| self.rejected(e))?;
                self.record_reply(&reply);
                Ok(reply)
            })
            .collect()
    }

    fn protocol_error(&self, error: JsonRpcError) -> Error {
        Error::JsonRpc(error.with_encoder(self.encoder.clone()))
    }

    fn rejected(&self, error: Error) -> Error {
        tracing::warn!(error = %error, "Message rejected");
        if let Some(ref m) = self.metrics {
            m.record_error(error_label(&error));
        }
        error
    }

    fn record_reply(&self, reply: &JsonRpcResponse) {
        if let Some(ref m) = self.metrics {
            m.record_reply(if reply.is_success() { "success" } else { "error" });
        }
    }
}

impl Default for JsonRpcProtocol {
    fn default() -> Self {
        Self::new()
    }
}

fn error_label(error: &Error) -> &'static str {
    match error {
        Error::JsonRpc(e) => match e.kind() {
            ErrorKind::ParseError => "parse_error",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::MethodNotFound => "method_not_found",
            ErrorKind::InvalidParams => "invalid_params",
            ErrorKind::InternalError => "internal_error",
            ErrorKind::ServerError => "server_error",
        },
        Error::InvalidRequest(_) => "invalid_request",
        Error::MethodNotFound(_) => "method_not_found",
        Error::InvalidReply(_) => "invalid_reply",
        Error::Serialization(_) => "serialization",
        Error::Application { .. } | Error::Server(_) => "server_error",
    }
}

impl RpcProtocol for JsonRpcProtocol {
    type Request = JsonRpcRequest;
    type Response = JsonRpcResponse;
    type Incoming = RequestMessage;

    fn create_request(
        &self,
        method: &str,
        args: Option<Vec<Value>>,
        kwargs: Option<Map<String, Value>>,
        one_way: bool,
    ) -> Result<JsonRpcRequest> {
        JsonRpcProtocol::create_request(self, method, args, kwargs, one_way)
    }

    fn parse_request(&self, data: &str) -> Result<RequestMessage> {
        JsonRpcProtocol::parse_request(self, data)
    }

    fn parse_reply(&self, data: &str) -> Result<JsonRpcResponse> {
        JsonRpcProtocol::parse_reply(self, data)
    }
}

impl RpcBatchProtocol for JsonRpcProtocol {
    type BatchRequest = JsonRpcBatchRequest;

    fn create_batch_request(&self, requests: Option<Vec<JsonRpcRequest>>) -> JsonRpcBatchRequest {
        JsonRpcProtocol::create_batch_request(self, requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BatchItem;
    use serde_json::json;

    fn protocol() -> JsonRpcProtocol {
        JsonRpcProtocol::new()
    }

    #[test]
    fn test_ids_increase_from_one() {
        let protocol = protocol();
        let first = protocol.create_request("a", None, None, false).unwrap();
        let second = protocol.create_request("b", None, None, false).unwrap();

        assert_eq!(first.unique_id, Some(Id::Number(1)));
        assert_eq!(second.unique_id, Some(Id::Number(2)));
    }

    #[test]
    fn test_one_way_does_not_consume_id() {
        let protocol = protocol();
        let one_way = protocol.create_request("a", None, None, true).unwrap();
        let next = protocol.create_request("b", None, None, false).unwrap();

        assert!(one_way.unique_id.is_none());
        assert_eq!(next.unique_id, Some(Id::Number(1)));
    }

    #[test]
    fn test_failed_create_does_not_consume_id() {
        let protocol = protocol();
        let mut kwargs = Map::new();
        kwargs.insert("x".into(), json!(1));

        assert!(protocol
            .create_request("foo", Some(vec![json!("a"), json!("b")]), Some(kwargs), false)
            .is_err());
        let next = protocol.create_request("foo", None, None, false).unwrap();
        assert_eq!(next.unique_id, Some(Id::Number(1)));
    }

    #[test]
    fn test_empty_args_count_as_absent() {
        let mut kwargs = Map::new();
        kwargs.insert("x".into(), json!(1));

        let request = protocol()
            .create_request("foo", Some(vec![]), Some(kwargs), false)
            .unwrap();
        assert_eq!(request.kwargs().unwrap()["x"], 1);
        assert!(request.args().is_none());
    }

    #[test]
    fn test_blank_method_rejected() {
        let protocol = protocol();
        for method in ["", "   ", "\t\n"] {
            let result = protocol.create_request(method, None, None, false);
            assert!(matches!(result, Err(Error::InvalidRequest(_))), "method: {:?}", method);
        }

        let first = protocol.create_request("ping", None, None, false).unwrap();
        assert_eq!(first.unique_id, Some(Id::Number(1)));
    }

    #[test]
    fn test_create_batch_request_default_empty() {
        let batch = protocol().create_batch_request(None);
        assert!(batch.is_empty());
        assert_eq!(batch.serialize().unwrap(), "[]");
    }

    #[test]
    fn test_parse_request_invalid_json() {
        match protocol().parse_request("{not json") {
            Err(Error::JsonRpc(e)) => assert_eq!(e.kind(), ErrorKind::ParseError),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_request_batch_limit() {
        let protocol = JsonRpcProtocol::builder().max_batch_size(1).build();
        let data = r#"[{"jsonrpc":"2.0","method":"a","id":1},{"jsonrpc":"2.0","method":"b","id":2}]"#;

        match protocol.parse_request(data) {
            Err(Error::JsonRpc(e)) => {
                assert_eq!(e.code(), -32600);
                assert!(e.message().contains("limit=1"));
                assert!(e.message().contains("actual=2"));
            }
            other => panic!("Expected batch size error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_request_batch_non_object_element() {
        let batch = protocol()
            .parse_request(r#"[1, {"jsonrpc":"2.0","method":"a"}]"#)
            .unwrap()
            .into_batch()
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.items()[0].as_error().unwrap().kind(), ErrorKind::InvalidRequest);
        assert!(matches!(&batch.items()[1], BatchItem::Request(r) if r.is_one_way()));
    }

    #[test]
    fn test_parse_batch_reply() {
        let replies = protocol()
            .parse_batch_reply(
                r#"[{"jsonrpc":"2.0","id":1,"result":7},
                    {"jsonrpc":"2.0","id":2,"error":{"message":"Invalid params","code":-32602}}]"#,
            )
            .unwrap();

        assert_eq!(replies.len(), 2);
        assert!(replies[0].is_success());
        assert!(replies[1].is_error());
        assert_eq!(replies[1].unique_id(), Some(&Id::Number(2)));
    }

    #[test]
    fn test_parse_batch_reply_rejections() {
        let protocol = protocol();
        assert!(matches!(protocol.parse_batch_reply("[]"), Err(Error::InvalidReply(_))));
        assert!(matches!(
            protocol.parse_batch_reply(r#"{"jsonrpc":"2.0","id":1,"result":7}"#),
            Err(Error::InvalidReply(_))
        ));
        assert!(matches!(
            protocol.parse_batch_reply(r#"[{"jsonrpc":"2.0","result":7}]"#),
            Err(Error::InvalidReply(_))
        ));
        assert!(matches!(protocol.parse_batch_reply("nope"), Err(Error::InvalidReply(_))));
    }

    #[test]
    fn test_trait_objects_delegate() {
        fn roundtrip<P>(protocol: &P) -> P::Incoming
        where
            P: RpcBatchProtocol<Request = JsonRpcRequest>,
        {
            let request = protocol
                .create_request("echo", Some(vec![json!(1)]), None, false)
                .unwrap();
            assert!(protocol.supports_one_way());
            let _batch = protocol.create_batch_request(Some(vec![request.clone()]));
            protocol.parse_request(&request.serialize().unwrap()).unwrap()
        }

        let incoming = roundtrip(&protocol());
        assert_eq!(incoming.into_single().unwrap().method, "echo");
    }
}
