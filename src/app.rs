//! The application object.
//!
//! One `App` per process: it owns the configuration, the routing table and
//! the middleware that runs ahead of every route. Routers are attached while
//! building; afterwards the app is handed to the [`Server`](crate::Server)
//! and only read.

use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::dispatch::Next;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::table::RouteTable;
use crate::tree::Match;

/// Routing table plus request handling.
///
/// ```rust
/// use ovenjoy::{App, HandlerResult, Method, Next, Request, Response, Router};
///
/// async fn hello(req: Request, mut res: Response, _next: Next) -> HandlerResult {
///     res.text(format!("hello {}", req.param("name").unwrap_or("world")));
///     Ok(res)
/// }
///
/// # fn main() -> Result<(), ovenjoy::Error> {
/// let mut app = App::new();
/// app.attach("/", Router::new().get("/hello/:name", hello))?;
///
/// assert!(app.lookup(Method::Get, "/hello/ann").is_some());
/// # Ok(())
/// # }
/// ```
pub struct App {
    config: Config,
    table: RouteTable,
    global: Vec<BoxedHandler>,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut global = Vec::new();
        if config.parse_query {
            global.push(middleware::query.into_boxed_handler());
        }
        if config.parse_body {
            global.push(middleware::body.into_boxed_handler());
        }
        Self {
            table: RouteTable::new(config.trailing_slash_redirect),
            config,
            global,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Makes `router`'s routes live under `prefix`.
    ///
    /// Each router should be attached once; attaching the same routes again
    /// replaces them.
    pub fn attach(&mut self, prefix: &str, router: Router) -> Result<&mut Self, Error> {
        router.attach(&mut self.table, prefix)?;
        Ok(self)
    }

    /// Resolves a method and path without running anything.
    pub fn lookup(&self, method: Method, path: &str) -> Option<Match> {
        self.table.lookup(method, path)
    }

    /// Routes and runs one request.
    ///
    /// The built-in middleware enabled in [`Config`] runs first, then the
    /// route's own chain. Fails with [`Error::RouteNotFound`] when nothing
    /// matches, [`Error::Handler`] when a handler aborts and
    /// [`Error::Incomplete`] when no handler finalized the response.
    pub async fn handle(&self, mut req: Request) -> Result<Response, Error> {
        let method = req.method();

        let Some(matched) = self.table.lookup(method, req.path()) else {
            return Err(Error::RouteNotFound { method, path: req.path().to_owned() });
        };

        debug!(%method, path = req.path(), route = matched.route.pattern(), "dispatching");

        let chain: Arc<[BoxedHandler]> = self
            .global
            .iter()
            .chain(matched.route.handlers.iter())
            .cloned()
            .collect();
        let path = req.path().to_owned();
        req.bind(matched);

        let res = Next::start(chain).run(req, Response::new()).await?;
        if !res.is_ready() {
            return Err(Error::Incomplete { method, path });
        }
        Ok(res)
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}
