//! JSON-RPC 2.0 over HTTP transport adapter.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::call::MethodCall;
use crate::error::{EngineFault, TransportError};
use crate::transport::{CallOutcome, RpcTransport};
use crate::value::RpcValue;

const JSONRPC_VERSION: &str = "2.0";

/// Sends calls to the engine's JSON-RPC endpoint, batching multi-calls into one
/// JSON array request.
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: usize,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize)]
struct Response {
    id: Option<usize>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    code: i64,
    message: String,
}

impl JsonRpcTransport {
    /// Build a transport for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unreachable`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Unreachable {
                endpoint: endpoint.clone(),
                detail: err.to_string(),
            })?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint this transport posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: &Value) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|err| self.classify(&err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|_| TransportError::Malformed {
                reason: "response body is not JSON",
            })
    }

    fn classify(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Unreachable {
                endpoint: self.endpoint.clone(),
                detail: err.to_string(),
            }
        }
    }
}

fn encode(calls: &[MethodCall]) -> Result<Value, TransportError> {
    let requests: Vec<Request<'_>> = calls
        .iter()
        .enumerate()
        .map(|(id, call)| Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: &call.method,
            params: call.args.iter().map(RpcValue::to_json).collect(),
        })
        .collect();
    serde_json::to_value(requests).map_err(|_| TransportError::Malformed {
        reason: "request batch could not be encoded",
    })
}

/// Match responses to calls by id; JSON-RPC allows batch replies in any order.
fn decode(expected: usize, body: Value) -> Result<Vec<CallOutcome>, TransportError> {
    let responses: Vec<Response> = match body {
        Value::Array(_) => serde_json::from_value(body),
        single => serde_json::from_value(single).map(|response| vec![response]),
    }
    .map_err(|_| TransportError::Malformed {
        reason: "unexpected response envelope",
    })?;

    let mut by_id: HashMap<usize, CallOutcome> = HashMap::with_capacity(responses.len());
    for response in responses {
        let id = response.id.ok_or(TransportError::Malformed {
            reason: "response without id",
        })?;
        let outcome = match (response.error, response.result) {
            (Some(error), _) => Err(EngineFault {
                code: error.code,
                message: error.message,
            }),
            (None, result) => Ok(RpcValue::from_json(result.unwrap_or(Value::Null))),
        };
        by_id.insert(id, outcome);
    }

    (0..expected)
        .map(|id| {
            by_id.remove(&id).ok_or(TransportError::Malformed {
                reason: "missing response for request id",
            })
        })
        .collect()
}

#[async_trait]
impl RpcTransport for JsonRpcTransport {
    async fn multicall(&self, calls: &[MethodCall]) -> Result<Vec<CallOutcome>, TransportError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        debug!(endpoint = %self.endpoint, calls = calls.len(), "posting engine batch");
        let body = self.post(&encode(calls)?).await?;
        decode(calls.len(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_are_numbered_in_call_order() -> anyhow::Result<()> {
        let body = encode(&[
            MethodCall::new("d.start").arg("ABC"),
            MethodCall::new("throttle.global_down.max_rate.set")
                .arg("")
                .arg(102_400_i64),
        ])?;
        assert_eq!(
            body,
            json!([
                {"jsonrpc": "2.0", "id": 0, "method": "d.start", "params": ["ABC"]},
                {
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "throttle.global_down.max_rate.set",
                    "params": ["", 102_400]
                },
            ])
        );
        Ok(())
    }

    #[test]
    fn out_of_order_replies_are_realigned() -> anyhow::Result<()> {
        let outcomes = decode(
            2,
            json!([
                {
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {"code": -501, "message": "Could not find info-hash."}
                },
                {"jsonrpc": "2.0", "id": 0, "result": 0},
            ]),
        )?;
        assert_eq!(outcomes[0], Ok(RpcValue::Int(0)));
        assert_eq!(
            outcomes[1],
            Err(EngineFault {
                code: -501,
                message: "Could not find info-hash.".into()
            })
        );
        Ok(())
    }

    #[test]
    fn missing_replies_are_malformed() {
        let result = decode(2, json!([{"jsonrpc": "2.0", "id": 0, "result": 1}]));
        assert_eq!(
            result,
            Err(TransportError::Malformed {
                reason: "missing response for request id"
            })
        );
        assert!(decode(1, json!("garbage")).is_err());
    }
}
