//! Custom value encoders plugged into the protocol

use chrono::DateTime;
use jrpc_core::{Encoder, JsonRpcError, JsonRpcProtocol, PrettyEncoder, Result};
use serde_json::{json, Map, Value};

/// Renders RFC 3339 timestamps as epoch seconds
#[derive(Debug)]
struct EpochEncoder;

impl EpochEncoder {
    fn convert(value: &Value) -> Value {
        match value {
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => json!(ts.timestamp()),
                Err(_) => value.clone(),
            },
            Value::Array(items) => Value::Array(items.iter().map(Self::convert).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::convert(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl Encoder for EpochEncoder {
    fn encode(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&Self::convert(value))?)
    }
}

#[test]
fn test_custom_encoder_on_request() {
    let protocol = JsonRpcProtocol::builder().encoder(EpochEncoder).build();
    let mut kwargs = Map::new();
    kwargs.insert("at".into(), json!("2024-01-01T00:00:00Z"));
    kwargs.insert("label".into(), json!("new year"));

    let request = protocol.create_request("schedule", None, Some(kwargs), false).unwrap();
    let wire: Value = serde_json::from_str(&request.serialize().unwrap()).unwrap();

    assert_eq!(wire["params"]["at"], 1704067200);
    assert_eq!(wire["params"]["label"], "new year");
}

#[test]
fn test_custom_encoder_reaches_responses() {
    let protocol = JsonRpcProtocol::builder().encoder(EpochEncoder).build();
    let request = protocol.create_request("now", None, None, false).unwrap();

    let wire = request
        .respond(json!(["1970-01-01T00:01:40+00:00"]))
        .unwrap()
        .serialize()
        .unwrap();
    let wire: Value = serde_json::from_str(&wire).unwrap();
    assert_eq!(wire["result"], json!([100]));
}

#[test]
fn test_custom_encoder_reaches_batches() {
    let protocol = JsonRpcProtocol::builder().encoder(EpochEncoder).build();
    let batch = protocol
        .parse_request(r#"[{"jsonrpc":"2.0","method":"log","params":["2024-01-01T00:00:00Z"],"id":3}]"#)
        .unwrap()
        .into_batch()
        .unwrap();

    let wire: Value = serde_json::from_str(&batch.serialize().unwrap()).unwrap();
    assert_eq!(wire[0]["params"], json!([1704067200]));

    let request = batch.items()[0].as_request().unwrap();
    let reply = request.respond("2024-01-01T00:00:00Z").unwrap();
    let wire: Value = serde_json::from_str(&reply.serialize().unwrap()).unwrap();
    assert_eq!(wire["result"], 1704067200);
}

#[test]
fn test_pretty_encoder_on_parse_error() {
    let protocol = JsonRpcProtocol::builder().encoder(PrettyEncoder).build();
    let Err(jrpc_core::Error::JsonRpc(e)) = protocol.parse_request("{") else {
        panic!("Expected a parse error");
    };

    let text = e.error_respond().serialize().unwrap();
    assert!(text.contains('\n'));
    assert!(text.contains("-32700"));
}

#[test]
fn test_standalone_error_uses_default_encoder() {
    let text = JsonRpcError::method_not_found().error_respond().serialize().unwrap();
    assert!(!text.contains('\n'));

    let wire: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(wire["error"]["code"], -32601);
    assert_eq!(wire["id"], Value::Null);
}

#[test]
fn test_pretty_encoder_on_batch_error_elements() {
    let protocol = JsonRpcProtocol::builder().encoder(PrettyEncoder).build();
    let batch = protocol
        .parse_request(r#"[{"jsonrpc":"2.0","method":"log","id":1}, {"foo":"boo"}]"#)
        .unwrap()
        .into_batch()
        .unwrap();

    let text = batch.items()[1].error_respond().unwrap().serialize().unwrap();
    assert!(text.contains('\n'));
    assert!(text.contains("-32600"));

    let mut responses = batch.create_batch_response().unwrap();
    responses.push(batch.items()[1].error_respond().map(Into::into));
    assert!(responses.serialize().unwrap().contains('\n'));
    assert!(batch.serialize().unwrap().contains('\n'));
}
