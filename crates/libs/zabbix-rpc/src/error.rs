use crate::config::ConfigError;
use crate::version::Feature;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// JSON-RPC error codes the Zabbix frontend reports.
pub mod code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL: i64 = -32603;
    pub const APPLICATION: i64 = -32500;
}

/// Structured error object returned by the server inside the response envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{code} ({message}): {data}")]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
    #[serde(default, deserialize_with = "data_as_text")]
    pub data: String,
}

impl ProtocolError {
    pub fn new(code: i64, message: impl Into<String>, data: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: data.into() }
    }

    pub fn is_invalid_params(&self) -> bool {
        self.code == code::INVALID_PARAMS
    }
}

fn data_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum NetworkKind {
    ConnectionFailed,
    Dns,
    Timeout,
    Io,
    InvalidUrl,
    Proxy,
    Tls,
    Other,
}

/// Failure below the JSON-RPC layer: the exchange itself did not produce a usable envelope.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportFailure {
    #[error("rpc request failed: {summary}")]
    Network { kind: NetworkKind, summary: String },
    #[error("rpc request failed: http status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("malformed rpc response: {0}")]
    MalformedBody(String),
    #[error("failed to encode rpc request: {0}")]
    Encode(String),
}

impl TransportFailure {
    pub fn network(kind: NetworkKind, summary: impl Into<String>) -> Self {
        Self::Network { kind, summary: summary.into() }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { kind, .. } => {
                !matches!(kind, NetworkKind::InvalidUrl | NetworkKind::Proxy | NetworkKind::Tls)
            }
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::MalformedBody(_) | Self::Encode(_) => false,
        }
    }
}

/// A lookup that must match exactly one resource matched zero or several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CardinalityError {
    #[error("expected exactly one result, got 0")]
    NotFound,
    #[error("expected exactly one result, got {0}")]
    Ambiguous(usize),
}

impl CardinalityError {
    /// Returns `None` when `found` is exactly one.
    pub fn from_count(found: usize) -> Option<Self> {
        match found {
            0 => Some(Self::NotFound),
            1 => None,
            n => Some(Self::Ambiguous(n)),
        }
    }

    pub fn found(&self) -> usize {
        match self {
            Self::NotFound => 0,
            Self::Ambiguous(n) => *n,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZabbixError {
    #[error(transparent)]
    Transport(#[from] TransportFailure),
    #[error("rpc error {0}")]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Cardinality(#[from] CardinalityError),
    #[error("{feature} is not supported by server version {version}")]
    UnsupportedFeature { feature: Feature, version: String },
    #[error("failed to decode payload: {0}")]
    Decode(String),
    #[error("server version has not been detected; login or detect the version first")]
    VersionNotDetected,
    #[error("expected {expected} deleted ids, got {got}")]
    DeleteCountMismatch { expected: usize, got: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ZabbixError {
    pub fn unsupported(feature: Feature, version: Option<&str>) -> Self {
        Self::UnsupportedFeature {
            feature,
            version: version.unwrap_or("unknown").to_owned(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Only transport failures are ever worth retrying; protocol errors are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(failure) => failure.is_retryable(),
            _ => false,
        }
    }

    pub fn protocol_code(&self) -> Option<i64> {
        match self {
            Self::Protocol(error) => Some(error.code),
            _ => None,
        }
    }

    pub fn as_transport(&self) -> Option<&TransportFailure> {
        match self {
            Self::Transport(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ZabbixError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
