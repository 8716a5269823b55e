//! Query-string parsing.

use std::collections::HashMap;

use url::form_urlencoded;

use crate::dispatch::Next;
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// Decoded `key=value` pairs.
///
/// Repeated keys keep every value in order: `?tag=a&tag=b` gives
/// `get("tag") == Some("a")` and `get_all("tag") == ["a", "b"]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(HashMap<String, Vec<String>>);

impl Query {
    /// Decodes an `application/x-www-form-urlencoded` string.
    pub fn parse(input: &[u8]) -> Self {
        let mut pairs: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in form_urlencoded::parse(input) {
            pairs.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        Self(pairs)
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses the query string into a [`Query`] extension. Always continues.
///
/// Requests without a query string get an empty `Query`.
pub async fn query(mut req: Request, res: Response, next: Next) -> HandlerResult {
    let parsed = Query::parse(req.query_string().unwrap_or_default().as_bytes());
    req.extensions_mut().insert(parsed);
    next.run(req, res).await
}
