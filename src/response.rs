//! Outgoing HTTP response type.
//!
//! Every request starts with an empty `200 OK` response that travels down
//! the handler chain next to the request. Handlers adjust status and headers,
//! then *finalize* it with [`send`](Response::send), [`text`](Response::text),
//! [`json`](Response::json) or [`end`](Response::end). A finalized response is
//! frozen: the chain stops and later writes are dropped.

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http_body_util::Full;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::HandlerError;

/// An outgoing HTTP response under construction.
///
/// ```rust
/// use http::StatusCode;
/// use ovenjoy::Response;
///
/// let mut res = Response::new();
/// res.set_status(StatusCode::CREATED)
///    .set_header("location", "/users/42");
/// res.json(&serde_json::json!({ "id": 42 })).unwrap();
///
/// assert!(res.is_ready());
/// ```
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    ready: bool,
}

impl Response {
    /// An empty, unfinished `200 OK`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HashMap<String, String> { &self.headers }
    pub fn body(&self) -> Option<&[u8]> { self.body.as_deref() }

    /// `true` once a handler has finalized the response.
    pub fn is_ready(&self) -> bool { self.ready }

    /// Header lookup by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        if self.writable("status") {
            self.status = status;
        }
        self
    }

    /// Sets a header; the last write for a name wins.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if self.writable("header") {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Finalizes with a raw body. No content type is added.
    pub fn send(&mut self, body: impl Into<Bytes>) {
        if self.writable("body") {
            self.body = Some(body.into());
            self.ready = true;
        }
    }

    /// Finalizes with a plain-text body.
    pub fn text(&mut self, body: impl Into<String>) {
        self.default_content_type("text/plain; charset=utf-8");
        self.send(body.into());
    }

    /// Finalizes with `value` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), HandlerError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| HandlerError::new(format!("serializing response: {e}")).with_source(e))?;
        self.default_content_type("application/json");
        self.send(bytes);
        Ok(())
    }

    /// Finalizes without a body.
    pub fn end(&mut self) {
        if self.writable("body") {
            self.ready = true;
        }
    }

    fn default_content_type(&mut self, value: &str) {
        let present = self.headers.keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if !self.ready && !present {
            self.headers.insert(CONTENT_TYPE.as_str().to_owned(), value.to_owned());
        }
    }

    fn writable(&self, what: &'static str) -> bool {
        if self.ready {
            warn!(what, "write to a finalized response ignored");
        }
        !self.ready
    }

    /// Converts into the hyper response the server writes out.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(self.body.unwrap_or_default()))
            .unwrap_or_else(|e| {
                error!("invalid response: {e}");
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
