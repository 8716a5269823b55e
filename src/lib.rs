//! # ovenjoy
//!
//! A minimal HTTP framework: a radix-tree router, composable routers and an
//! express-style middleware chain on top of tokio and hyper.
//!
//! ## The moving parts
//!
//! - **Route trees**: one per method. Static segments beat `:placeholders`,
//!   which beat a trailing `**` wildcard. Static routes resolve with a single
//!   hash lookup.
//! - **Routers**: collect routes and router-scoped middleware, nest with
//!   [`Router::mount`], and go live with [`App::attach`].
//! - **Handler chains**: every handler gets the request, the response and a
//!   [`Next`]. It either finalizes the response or hands both on with
//!   [`Next::run`]. Returning an error stops the chain.
//!
//! TLS, rate limiting and timeouts belong to the reverse proxy in front.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ovenjoy::{App, HandlerResult, Next, Request, Response, Router, Server, handlers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ovenjoy::Error> {
//!     let users = Router::new()
//!         .get("/:id", get_user)
//!         .post("/", handlers![require_json, create_user]);
//!
//!     let mut app = App::new();
//!     app.attach("/", Router::new().mount("/users", users))?;
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request, mut res: Response, _next: Next) -> HandlerResult {
//!     let id = req.param("id").unwrap_or("unknown");
//!     res.json(&serde_json::json!({ "id": id }))?;
//!     Ok(res)
//! }
//!
//! async fn require_json(req: Request, mut res: Response, next: Next) -> HandlerResult {
//!     if req.json().is_none() {
//!         res.set_status(http::StatusCode::BAD_REQUEST).end();
//!         return Ok(res);
//!     }
//!     next.run(req, res).await
//! }
//!
//! async fn create_user(_req: Request, mut res: Response, _next: Next) -> HandlerResult {
//!     res.set_status(http::StatusCode::CREATED)
//!        .set_header("location", "/users/99");
//!     res.end();
//!     Ok(res)
//! }
//! ```

mod app;
mod config;
mod dispatch;
mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod table;
mod tree;

pub mod handler;
pub mod middleware;
pub mod path;

pub use app::App;
pub use config::Config;
pub use dispatch::{Next, execute};
pub use error::{Error, HandlerError};
pub use handler::{Chain, Handler, HandlerResult};
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::{Server, serve_listener};
pub use table::{Register, RouteTable};
pub use tree::{Match, RouteData, RouteTree};
