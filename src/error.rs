//! Unified error types.

use std::any::Any;
use std::borrow::Cow;

use http::StatusCode;
use thiserror::Error;

use crate::method::Method;

/// The error type returned by ovenjoy's fallible operations.
///
/// Registration problems surface as [`Error::InvalidRoute`] while the app is
/// being built. Everything else is produced per request by
/// [`App::handle`](crate::App::handle) and turned into an HTTP response by the
/// server.
#[derive(Debug, Error)]
pub enum Error {
    /// A route pattern could not be registered.
    #[error("invalid route `{pattern}`: {reason}")]
    InvalidRoute { pattern: String, reason: &'static str },

    /// No route tree entry matched the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// A handler aborted the chain.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The chain ran out of handlers before any of them produced a response.
    #[error("handler chain for {method} {path} ended without a response")]
    Incomplete { method: Method, path: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid_route(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidRoute { pattern: pattern.to_owned(), reason }
    }

    /// The HTTP status the server answers with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Handler(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Returned by a handler to abort its chain.
///
/// Later handlers do not run. The status defaults to `500 Internal Server
/// Error`; use [`HandlerError::with_status`] for client errors.
///
/// ```rust
/// use ovenjoy::{HandlerError, HandlerResult, Next, Request, Response};
/// use http::StatusCode;
///
/// async fn require_token(req: Request, res: Response, next: Next) -> HandlerResult {
///     if req.header("authorization").is_none() {
///         return Err(HandlerError::with_status(StatusCode::UNAUTHORIZED, "missing token"));
///     }
///     next.run(req, res).await
/// }
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    status: StatusCode,
    message: Cow<'static, str>,
    #[source]
    source: Option<Source>,
}

impl HandlerError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self { status, message: message.into(), source: None }
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<Source>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::new(format!("handler panicked: {detail}"))
    }
}

impl From<&'static str> for HandlerError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, format!("invalid json: {e}")).with_source(e)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        Self::new(format!("io: {e}")).with_source(e)
    }
}
