use super::{HttpReply, HttpSender};
use crate::config::ClientConfig;
use crate::error::{NetworkKind, TransportFailure};
use std::io::Read;
use std::time::Duration;
use ureq::ErrorKind;

#[derive(Debug)]
pub struct UreqSender {
    agent: ureq::Agent,
}

impl UreqSender {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportFailure> {
        let mut builder = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout())
            .timeout_read(config.read_timeout())
            .timeout_write(config.write_timeout())
            .user_agent(&config.user_agent);
        if let Some(proxy) = config.proxy.as_deref().filter(|value| !value.trim().is_empty()) {
            let proxy = ureq::Proxy::new(proxy).map_err(|err| {
                TransportFailure::network(NetworkKind::Proxy, format!("invalid proxy url: {err}"))
            })?;
            builder = builder.proxy(proxy);
        }
        Ok(Self { agent: builder.build() })
    }

    pub fn with_timeouts(connect: Duration, read: Duration, write: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .timeout_write(write)
                .build(),
        }
    }
}

impl HttpSender for UreqSender {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        match request.send_bytes(body) {
            Ok(response) => {
                let status = response.status();
                let body = read_response_body(response)?;
                Ok(HttpReply { status, body })
            }
            Err(ureq::Error::Status(status, response)) => {
                // The body of an error status is only used for tracing.
                let body = read_response_body(response).unwrap_or_default();
                Ok(HttpReply { status, body })
            }
            Err(ureq::Error::Transport(transport)) => Err(TransportFailure::network(
                classify_transport_error(&transport),
                summarize_transport_error(&transport),
            )),
        }
    }
}

/// Upper bound on the buffer reserved up front from a `Content-Length` header.
const MAX_PREALLOCATED_BODY: usize = 1 << 20;

fn read_response_body(response: ureq::Response) -> Result<Vec<u8>, TransportFailure> {
    let content_length =
        response.header("Content-Length").and_then(|value| value.parse::<u64>().ok());
    let mut reader = response.into_reader();

    let Some(length) = content_length else {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(read_failure)?;
        return Ok(bytes);
    };

    let reserve = usize::try_from(length).unwrap_or(usize::MAX).min(MAX_PREALLOCATED_BODY);
    let mut bytes = Vec::with_capacity(reserve);
    reader.take(length).read_to_end(&mut bytes).map_err(read_failure)?;
    if (bytes.len() as u64) < length {
        return Err(TransportFailure::MalformedBody(format!(
            "response body truncated: Content-Length {length}, received {} bytes",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn read_failure(err: std::io::Error) -> TransportFailure {
    let kind = match err.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            return TransportFailure::MalformedBody(format!("response body truncated: {err}"));
        }
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => NetworkKind::Timeout,
        _ => NetworkKind::Io,
    };
    TransportFailure::network(kind, format!("failed to read rpc response: {err}"))
}

fn classify_transport_error(transport: &ureq::Transport) -> NetworkKind {
    match transport.kind() {
        ErrorKind::ConnectionFailed => NetworkKind::ConnectionFailed,
        ErrorKind::Dns => NetworkKind::Dns,
        ErrorKind::Io => {
            let text = transport_text(transport).to_ascii_lowercase();
            if text.contains("timed out") || text.contains("timeout") {
                NetworkKind::Timeout
            } else {
                NetworkKind::Io
            }
        }
        ErrorKind::InvalidUrl | ErrorKind::UnknownScheme => NetworkKind::InvalidUrl,
        ErrorKind::ProxyConnect | ErrorKind::ProxyUnauthorized | ErrorKind::InvalidProxyUrl => {
            NetworkKind::Proxy
        }
        ErrorKind::InsecureRequestHttpsOnly => NetworkKind::Tls,
        ErrorKind::TooManyRedirects
        | ErrorKind::BadStatus
        | ErrorKind::BadHeader
        | ErrorKind::HTTP => NetworkKind::Other,
    }
}

fn transport_text(transport: &ureq::Transport) -> String {
    let mut details = Vec::new();
    if let Some(message) = transport.message() {
        let cleaned = clean_transport_text(message);
        if !cleaned.is_empty() {
            details.push(cleaned);
        }
    }

    if let Some(source) = std::error::Error::source(transport) {
        let cleaned = clean_transport_text(&source.to_string());
        if !cleaned.is_empty() && !details.iter().any(|existing| existing == &cleaned) {
            details.push(cleaned);
        }
    }
    details.join(": ")
}

fn summarize_transport_error(transport: &ureq::Transport) -> String {
    let category = match transport.kind() {
        ErrorKind::ConnectionFailed => "connection refused or target unavailable",
        ErrorKind::Dns => "dns lookup failed",
        ErrorKind::Io => "network i/o error",
        ErrorKind::InvalidUrl => "invalid rpc url",
        ErrorKind::UnknownScheme => "unsupported rpc url scheme",
        ErrorKind::TooManyRedirects => "too many redirects",
        ErrorKind::ProxyConnect => "proxy connect failed",
        ErrorKind::ProxyUnauthorized => "proxy authentication failed",
        ErrorKind::InvalidProxyUrl => "invalid proxy url",
        ErrorKind::BadStatus => "bad status line from server",
        ErrorKind::BadHeader => "bad header from server",
        ErrorKind::InsecureRequestHttpsOnly => "insecure request blocked by https-only setting",
        ErrorKind::HTTP => "http status error",
    };

    let detail_text = transport_text(transport);
    let detail_text_lower = detail_text.to_ascii_lowercase();
    if detail_text_lower.contains("status line") {
        if detail_text_lower.contains("timed out") || detail_text_lower.contains("timeout") {
            return "endpoint reachable but did not return a valid http response (timed out reading status line)"
                .to_string();
        }
        return "endpoint reachable but did not return a valid http response".to_string();
    }

    if detail_text.is_empty() {
        category.to_string()
    } else {
        format!("{category}: {detail_text}")
    }
}

fn clean_transport_text(input: &str) -> String {
    let mut text = input.trim();
    for prefix in [
        "Network Error:",
        "network error:",
        "Connection Failed:",
        "connection failed:",
        "Error encountered:",
        "Error encountered in the status line:",
        "error encountered in the status line:",
        "Error encountered while reading response:",
        "error encountered while reading response:",
    ] {
        while let Some(rest) = text.strip_prefix(prefix) {
            text = rest.trim_start();
        }
    }
    text.to_string()
}
