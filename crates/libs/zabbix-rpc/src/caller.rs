use crate::config::{AuthPlacement, ClientConfig};
use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::{TransportFailure, ZabbixError};
use crate::trace::{self, TraceSink};
use crate::transport::{HttpSender, UreqSender};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static NEXT_CORRELATION_ID: AtomicU64 = AtomicU64::new(1);

/// Next process-wide correlation id. Ids only pair a request with its response in traces.
pub fn next_correlation_id() -> u64 {
    NEXT_CORRELATION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Authenticated call seam used by the resource adapters and the facade.
pub trait RpcCall {
    fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, ZabbixError>;

    /// Raw server version, when one has been negotiated. Used in error messages.
    fn server_version(&self) -> Option<String> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResultTrace {
    Full,
    Redacted,
}

/// Executes one JSON-RPC exchange per call over an [`HttpSender`].
pub struct Caller {
    endpoint: String,
    user_agent: String,
    auth_placement: AuthPlacement,
    sender: Box<dyn HttpSender>,
    serialize: Option<Mutex<()>>,
    trace: Option<Arc<dyn TraceSink>>,
}

impl Caller {
    pub fn new(config: &ClientConfig) -> Result<Self, ZabbixError> {
        let sender = UreqSender::new(config)?;
        Ok(Self::with_sender(config, sender))
    }

    pub fn with_sender(config: &ClientConfig, sender: impl HttpSender + 'static) -> Self {
        Self {
            endpoint: config.endpoint(),
            user_agent: config.user_agent.clone(),
            auth_placement: config.auth_placement,
            sender: Box::new(sender),
            serialize: config.serialize.then(|| Mutex::new(())),
            trace: config.trace_wire.then(trace::shared_default),
        }
    }

    /// Replaces the trace sink; tracing is enabled even if the config disabled it.
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_serialized(&self) -> bool {
        self.serialize.is_some()
    }

    /// Calls `method`, attaching `auth` when given.
    ///
    /// A server error object is returned as [`ZabbixError::Protocol`]; anything that
    /// prevented a well-formed envelope from arriving is [`ZabbixError::Transport`].
    pub fn call(
        &self,
        method: &str,
        params: JsonValue,
        auth: Option<&str>,
    ) -> Result<JsonValue, ZabbixError> {
        self.exchange(method, params, auth, ResultTrace::Full)
    }

    pub fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
        auth: Option<&str>,
    ) -> Result<T, ZabbixError> {
        let value = self.call(method, params, auth)?;
        serde_json::from_value(value).map_err(|err| {
            ZabbixError::decode(format!("failed to decode result of {method}: {err}"))
        })
    }

    /// Same as [`Caller::call`] but keeps the result out of trace lines.
    pub(crate) fn call_redacted(
        &self,
        method: &str,
        params: JsonValue,
        auth: Option<&str>,
    ) -> Result<JsonValue, ZabbixError> {
        self.exchange(method, params, auth, ResultTrace::Redacted)
    }

    fn exchange(
        &self,
        method: &str,
        params: JsonValue,
        auth: Option<&str>,
        result_trace: ResultTrace,
    ) -> Result<JsonValue, ZabbixError> {
        // Held from envelope construction until the response is decoded.
        let _serialized =
            self.serialize.as_ref().map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner));

        let id = next_correlation_id();
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json-rpc".to_owned()),
            ("User-Agent".to_owned(), self.user_agent.clone()),
        ];
        let envelope_auth = match (self.auth_placement, auth) {
            (_, None) => None,
            (AuthPlacement::Envelope, Some(token)) => Some(token.to_owned()),
            (AuthPlacement::BearerHeader, Some(token)) => {
                headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
                None
            }
        };

        let request = serde_json::to_value(RpcRequest::new(id, method, params, envelope_auth))
            .map_err(|err| TransportFailure::Encode(err.to_string()))?;
        let body =
            serde_json::to_vec(&request).map_err(|err| TransportFailure::Encode(err.to_string()))?;
        self.emit(|| format!("Request (POST) id={id}: {}", trace::redact_secrets(&request)));

        let reply = match self.sender.post(&self.endpoint, &headers, &body) {
            Ok(reply) => reply,
            Err(failure) => {
                self.emit(|| format!("Error id={id}: {failure}"));
                return Err(failure.into());
            }
        };
        self.emit(|| match result_trace {
            ResultTrace::Full => {
                format!("Response ({}) id={id}: {}", reply.status, String::from_utf8_lossy(&reply.body))
            }
            ResultTrace::Redacted => format!("Response ({}) id={id}: <redacted>", reply.status),
        });

        if !reply.is_success() {
            return Err(TransportFailure::HttpStatus {
                status: reply.status,
                url: self.endpoint.clone(),
            }
            .into());
        }

        let response: RpcResponse = serde_json::from_slice(&reply.body)
            .map_err(|err| TransportFailure::MalformedBody(err.to_string()))?;
        if response.jsonrpc.is_empty() && response.error.is_none() && response.result.is_none() {
            return Err(TransportFailure::MalformedBody(
                "response is not a json-rpc envelope".to_owned(),
            )
            .into());
        }
        if let Some(response_id) = response.id {
            if response_id != id {
                log::warn!("rpc {method}: response id {response_id} does not match request id {id}");
            }
        }
        response.into_result().map_err(ZabbixError::from)
    }

    fn emit(&self, line: impl FnOnce() -> String) {
        if let Some(sink) = self.trace.as_ref() {
            sink.trace(&line());
        }
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caller")
            .field("endpoint", &self.endpoint)
            .field("auth_placement", &self.auth_placement)
            .field("serialize", &self.serialize.is_some())
            .field("trace", &self.trace.is_some())
            .finish()
    }
}
