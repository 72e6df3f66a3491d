//! HTTP seam under the JSON-RPC caller.
//!
//! [`HttpSender`] is the swap point for TLS policy, proxies, compression or a
//! test double; [`UreqSender`] is the blocking implementation used by default.

mod http;

pub use http::UreqSender;

use crate::error::TransportFailure;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpSender: Send + Sync {
    /// POST `body` to `url` and return the raw status and body.
    ///
    /// Non-2xx statuses are returned as replies, not errors; only failures that
    /// produced no response at all map to [`TransportFailure`].
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure>;
}

impl<T: HttpSender + ?Sized> HttpSender for Arc<T> {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure> {
        (**self).post(url, headers, body)
    }
}

impl<T: HttpSender + ?Sized> HttpSender for Box<T> {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportFailure> {
        (**self).post(url, headers, body)
    }
}
