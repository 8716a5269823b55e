//! HTTP method as a typed enum.
//!
//! The RFC 9110 methods routers register most, plus the WebDAV verbs
//! (RFC 4918) and `SEARCH` (RFC 5323). Each method gets its own route tree.
//!
//! Methods outside this list are answered with `405 Method Not Allowed` by
//! the server before routing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A routable HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    // WebDAV RFC 4918 ──────────────────────────────────────────────────────────
    Copy,
    Lock,
    Mkcol,
    Move,
    Propfind,
    Proppatch,
    Unlock,
    // RFC 5323 ─────────────────────────────────────────────────────────────────
    Search,
}

impl Method {
    /// Every routable method, in declaration order.
    pub const ALL: [Method; 16] = [
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
        Self::Copy,
        Self::Lock,
        Self::Mkcol,
        Self::Move,
        Self::Propfind,
        Self::Proppatch,
        Self::Unlock,
        Self::Search,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy      => "COPY",
            Self::Delete    => "DELETE",
            Self::Get       => "GET",
            Self::Head      => "HEAD",
            Self::Lock      => "LOCK",
            Self::Mkcol     => "MKCOL",
            Self::Move      => "MOVE",
            Self::Options   => "OPTIONS",
            Self::Patch     => "PATCH",
            Self::Post      => "POST",
            Self::Propfind  => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Put       => "PUT",
            Self::Search    => "SEARCH",
            Self::Trace     => "TRACE",
            Self::Unlock    => "UNLOCK",
        }
    }
}

/// The method string did not name a routable method.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown http method")]
pub struct UnknownMethod;

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(UnknownMethod)
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnknownMethod;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
