//! JSON-RPC 2.0 envelope types for the `/rpc` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Body was not valid JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Body was JSON but not a request object with a `method`.
pub const INVALID_REQUEST: i32 = -32600;
/// Every domain failure, with a descriptive message.
pub const INTERNAL_ERROR: i32 = -32603;

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }
}

/// A parsed request envelope.
///
/// `id` is `None` only when the field is absent; an explicit `"id": null` is a
/// request that expects a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Value,
    pub id: Option<Value>,
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo back, `null` for notifications.
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// Why a parsed body is not a usable request. Carries the id to echo.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRequest {
    pub id: Value,
    pub message: String,
}

impl Request {
    /// Interpret an already-parsed JSON body as a request envelope.
    pub fn from_value(body: Value) -> Result<Self, InvalidRequest> {
        let Value::Object(mut obj) = body else {
            return Err(InvalidRequest {
                id: Value::Null,
                message: "Invalid Request: expected a JSON object".into(),
            });
        };

        let id = obj.remove("id");
        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err(InvalidRequest {
                    id: id.unwrap_or(Value::Null),
                    message: "Invalid Request: missing method".into(),
                })
            }
        };

        Ok(Self {
            method,
            params: obj.remove("params").unwrap_or(Value::Null),
            id,
        })
    }
}
