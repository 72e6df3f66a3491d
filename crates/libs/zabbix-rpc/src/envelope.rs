use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: JsonValue, auth: Option<String>) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_owned(), method: method.into(), params, auth, id }
    }
}

/// Response envelope. A present `error` means failure no matter what `result` holds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default)]
    pub id: Option<u64>,
}

impl RpcResponse {
    pub fn success(id: u64, result: JsonValue) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_owned(), error: None, result: Some(result), id: Some(id) }
    }

    pub fn failure(id: Option<u64>, error: ProtocolError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION.to_owned(), error: Some(error), result: None, id }
    }

    pub fn into_result(self) -> Result<JsonValue, ProtocolError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(JsonValue::Null)),
        }
    }
}
