//! Built-in middleware.
//!
//! [`App`](crate::App) prepends these to every matched route when enabled in
//! [`Config`](crate::Config). Both store what they parse in the request's
//! extension table instead of touching the raw request:
//!
//! | Middleware | Stores | Read with |
//! |---|---|---|
//! | [`query`] | [`Query`] | [`Request::query`](crate::Request::query) |
//! | [`body`] | [`JsonBody`] or [`Form`] | [`Request::json`](crate::Request::json), `extensions().get::<Form>()` |

mod body;
mod query;

pub use body::{Form, JsonBody, body};
pub use query::{Query, query};
