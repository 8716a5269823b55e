//! Incoming HTTP request type.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Extensions;
use serde::de::DeserializeOwned;

use crate::error::HandlerError;
use crate::method::Method;
use crate::middleware::{JsonBody, Query};
use crate::tree::{Match, RouteData};

/// An incoming HTTP request as seen by handlers.
///
/// Method, path, headers and body are fixed when the request is built. The
/// matched route and its path parameters are filled in once by the
/// dispatcher before the first handler runs. Anything middleware derives
/// from the request goes into the typed [`extensions`](Request::extensions)
/// table.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    route: Option<Arc<RouteData>>,
    extensions: Extensions,
}

impl Request {
    /// Builds a request for `target`, a path with an optional `?query`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            route: None,
            extensions: Extensions::new(),
        }
    }

    pub(crate) fn from_parts(method: Method, uri: &http::Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            headers,
            body,
            params: HashMap::new(),
            route: None,
            extensions: Extensions::new(),
        }
    }

    /// Adds a header. Invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Records the resolved route. Runs once per request, before the chain.
    pub(crate) fn bind(&mut self, matched: Match) {
        debug_assert!(self.route.is_none(), "route bound twice");
        self.params = matched.params.unwrap_or_default();
        self.route = Some(matched.route);
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The raw query string, without the leading `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The route this request matched, once dispatch has begun.
    pub fn route(&self) -> Option<&RouteData> {
        self.route.as_deref()
    }

    /// Typed side-table for values added by middleware.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Parsed query, when the query middleware ran.
    pub fn query(&self) -> Option<&Query> {
        self.extensions.get::<Query>()
    }

    /// Parsed JSON body, when the body parser ran and the body was JSON.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.extensions.get::<JsonBody>().map(|b| &b.0)
    }

    /// Deserializes the raw body as JSON. Failures map to `400 Bad Request`.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
