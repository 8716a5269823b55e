//! Request-body parsing.

use http::header::CONTENT_TYPE;

use crate::dispatch::Next;
use crate::handler::HandlerResult;
use crate::middleware::Query;
use crate::request::Request;
use crate::response::Response;

/// A request body decoded from `application/json`.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonBody(pub serde_json::Value);

/// A request body decoded from `application/x-www-form-urlencoded`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form(pub Query);

/// Decodes the body according to its `content-type`. Always continues,
/// except for malformed JSON, which aborts with `400 Bad Request`.
///
/// Empty bodies and other content types (multipart included) are left as raw
/// bytes on the request.
pub async fn body(mut req: Request, res: Response, next: Next) -> HandlerResult {
    if !req.body().is_empty() {
        match media_type(&req) {
            Some("application/json") => {
                let value = serde_json::from_slice(req.body())?;
                req.extensions_mut().insert(JsonBody(value));
            }
            Some("application/x-www-form-urlencoded") => {
                let form = Form(Query::parse(req.body()));
                req.extensions_mut().insert(form);
            }
            _ => {}
        }
    }
    next.run(req, res).await
}

/// The media type without parameters, e.g. `application/json` for
/// `application/json; charset=utf-8`.
fn media_type(req: &Request) -> Option<&str> {
    let raw = req.header(CONTENT_TYPE.as_str())?;
    raw.split(';').next().map(str::trim)
}
