//! Composable route registration.
//!
//! A [`Router`] only collects routes. Nothing is visible to requests until
//! the router is attached to an [`App`](crate::App) (or any other
//! [`Register`] target). Routers nest by [`mount`](Router::mount)ing one into
//! another; mounting is flattened eagerly, so at runtime there is a single
//! route list per method and no router hierarchy to walk.
//!
//! Router middleware wraps every route of that router, registered before or
//! after the middleware itself:
//!
//! ```text
//! parent.middleware(a)
//!       .mount("/admin", child.middleware(b).get("/users", h))
//!       .middleware(c)
//!
//! GET /admin/users  →  [a, c, b, h]
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Chain, Handler};
use crate::method::Method;
use crate::path;
use crate::table::Register;

struct PendingRoute {
    pattern: String,
    handlers: Vec<BoxedHandler>,
}

/// A unit of route registration.
///
/// Every builder method takes and returns `self`, so registrations chain:
///
/// ```rust
/// # use ovenjoy::{handlers, HandlerResult, Next, Request, Response, Router};
/// # async fn list_users(_: Request, mut res: Response, _: Next) -> HandlerResult { res.text("[]"); Ok(res) }
/// # async fn get_user(_: Request, mut res: Response, _: Next) -> HandlerResult { res.text("{}"); Ok(res) }
/// # async fn audit(req: Request, res: Response, next: Next) -> HandlerResult { next.run(req, res).await }
/// let users = Router::new()
///     .get("/", list_users)
///     .get("/:id", get_user);
///
/// let api = Router::new()
///     .middleware(audit)
///     .mount("/users", users);
/// ```
#[derive(Default)]
pub struct Router {
    pending: HashMap<Method, Vec<PendingRoute>>,
    middleware: Vec<BoxedHandler>,
    mount_path: String,
}

macro_rules! method_shortcuts {
    ($($name:ident => $method:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Registers `handlers` for `", stringify!($method), "` requests to `pattern`.")]
            pub fn $name(self, pattern: &str, handlers: impl Into<Chain>) -> Self {
                self.on(Method::$method, pattern, handlers)
            }
        )+
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// A router whose patterns all live under `mount_path`.
    pub fn at(mount_path: &str) -> Self {
        Self { mount_path: mount_path.to_owned(), ..Self::default() }
    }

    /// Registers a handler chain for a method + pattern pair.
    ///
    /// Pattern segments starting with `:` bind one path segment to that name;
    /// a final `**` matches any remainder. The pattern is validated when the
    /// router is attached.
    pub fn on(mut self, method: Method, pattern: &str, handlers: impl Into<Chain>) -> Self {
        self.pending.entry(method).or_default().push(PendingRoute {
            pattern: pattern.to_owned(),
            handlers: handlers.into().into_vec(),
        });
        self
    }

    method_shortcuts! {
        get       => Get,
        post      => Post,
        put       => Put,
        delete    => Delete,
        patch     => Patch,
        head      => Head,
        options   => Options,
        trace     => Trace,
        search    => Search,
        propfind  => Propfind,
        proppatch => Proppatch,
        mkcol     => Mkcol,
        copy      => Copy,
        lock      => Lock,
        unlock    => Unlock,
        r#move    => Move,
    }

    /// Adds router-scoped middleware.
    ///
    /// It runs ahead of the handlers of every route on this router, including
    /// routes registered before this call.
    pub fn middleware(mut self, handler: impl Handler) -> Self {
        self.middleware.push(handler.into_boxed_handler());
        self
    }

    /// Merges `child`'s routes into this router under `prefix`.
    ///
    /// The child's middleware is baked into each merged route; this router's
    /// middleware goes in front when the routes leave this router.
    pub fn mount(mut self, prefix: &str, child: Router) -> Self {
        let base = path::join(prefix, &child.mount_path);
        let mut merged = 0;

        for (method, routes) in child.pending {
            let target = self.pending.entry(method).or_default();
            for route in routes {
                // Empty patterns stay empty so `attach` can reject them.
                let pattern = if route.pattern.is_empty() {
                    route.pattern
                } else {
                    path::join(&base, &route.pattern)
                };
                target.push(PendingRoute {
                    pattern,
                    handlers: compose(&child.middleware, route.handlers),
                });
                merged += 1;
            }
        }

        debug!(prefix = %base, routes = merged, "router mounted");
        self
    }

    /// Number of routes waiting to be attached.
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes every pending route into `target` under `global_prefix`.
    ///
    /// Stops at the first invalid pattern.
    pub fn attach(self, target: &mut impl Register, global_prefix: &str) -> Result<(), Error> {
        let base = path::join(global_prefix, &self.mount_path);

        for (method, routes) in self.pending {
            for route in routes {
                if route.pattern.is_empty() {
                    return Err(Error::invalid_route("", "pattern must not be empty"));
                }
                let full = path::join(&base, &route.pattern);
                target.register(&full, method, compose(&self.middleware, route.handlers))?;
            }
        }
        Ok(())
    }
}

fn compose(middleware: &[BoxedHandler], handlers: Vec<BoxedHandler>) -> Vec<BoxedHandler> {
    let mut chain = Vec::with_capacity(middleware.len() + handlers.len());
    chain.extend(middleware.iter().cloned());
    chain.extend(handlers);
    chain
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::dispatch::Next;
    use crate::handler::{BoxFuture, HandlerResult};
    use crate::handlers;
    use crate::request::Request;
    use crate::response::Response;
    use crate::table::RouteTable;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn mark(log: &Log, name: &'static str) -> impl Fn(Request, Response, Next) -> BoxFuture + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |req: Request, res: Response, next: Next| {
            log.lock().unwrap().push(name);
            let fut: BoxFuture = Box::pin(next.run(req, res));
            fut
        }
    }

    async fn ok(_req: Request, mut res: Response, _next: Next) -> HandlerResult {
        res.text("ok");
        Ok(res)
    }

    /// Attaches `router` and runs the chain matched by `GET path`.
    async fn get(router: Router, path: &str) -> Option<Response> {
        let mut table = RouteTable::default();
        router.attach(&mut table, "").unwrap();
        let matched = table.lookup(Method::Get, path)?;
        let mut req = Request::new(Method::Get, path);
        let chain = Arc::clone(&matched.route.handlers);
        req.bind(matched);
        Some(Next::start(chain).run(req, Response::new()).await.unwrap())
    }

    #[test]
    fn routes_stay_local_until_attached() {
        let router = Router::new().get("/a", ok).post("/a", ok).get("/b", ok);
        assert_eq!(router.len(), 3);

        let mut table = RouteTable::default();
        assert!(table.lookup(Method::Get, "/a").is_none());
        router.attach(&mut table, "").unwrap();
        assert!(table.lookup(Method::Get, "/a").is_some());
        assert!(table.lookup(Method::Post, "/a").is_some());
        assert!(table.lookup(Method::Post, "/b").is_none());
    }

    #[tokio::test]
    async fn middleware_applies_to_earlier_routes() {
        let log = Log::default();
        let router = Router::new()
            .get("/early", ok)
            .middleware(mark(&log, "mw"))
            .get("/late", ok);

        let res = get(router, "/early").await.unwrap();

        assert!(res.is_ready());
        assert_eq!(*log.lock().unwrap(), ["mw"]);
    }

    #[tokio::test]
    async fn middleware_applies_to_later_routes() {
        let log = Log::default();
        let router = Router::new().middleware(mark(&log, "mw")).get("/late", ok);

        get(router, "/late").await.unwrap();

        assert_eq!(*log.lock().unwrap(), ["mw"]);
    }

    #[tokio::test]
    async fn mount_prefixes_and_orders_middleware() {
        let log = Log::default();
        let child = Router::new()
            .middleware(mark(&log, "child"))
            .get("/users", handlers![mark(&log, "route"), ok]);
        let parent = Router::new()
            .middleware(mark(&log, "parent-before"))
            .mount("/admin", child)
            .middleware(mark(&log, "parent-after"));

        let res = get(parent, "/admin/users").await.unwrap();

        assert_eq!(res.body(), Some(&b"ok"[..]));
        assert_eq!(
            *log.lock().unwrap(),
            ["parent-before", "parent-after", "child", "route"]
        );
    }

    #[tokio::test]
    async fn mounted_routes_leave_the_child_path_unreachable() {
        let child = Router::new().get("/users", ok);
        let parent = Router::new().mount("/admin", child);

        assert!(get(parent, "/users").await.is_none());
    }

    #[tokio::test]
    async fn nested_mounts_flatten() {
        let leaf = Router::new().get("/:id", ok);
        let mid = Router::new().mount("/users", leaf);
        let root = Router::new().mount("/api", mid);

        let mut table = RouteTable::default();
        root.attach(&mut table, "/v1").unwrap();

        let m = table.lookup(Method::Get, "/v1/api/users/42").unwrap();
        assert_eq!(m.route.pattern(), "/v1/api/users/:id");
        assert_eq!(m.params.unwrap()["id"], "42");
    }

    #[test]
    fn mount_path_is_applied_on_attach_and_mount() {
        let mut table = RouteTable::default();
        Router::at("/health").get("/", ok).attach(&mut table, "/").unwrap();
        assert!(table.lookup(Method::Get, "/health").is_some());

        let mut table = RouteTable::default();
        Router::new()
            .mount("/svc", Router::at("/status").get("/live", ok))
            .attach(&mut table, "")
            .unwrap();
        assert!(table.lookup(Method::Get, "/svc/status/live").is_some());
    }

    #[test]
    fn attach_reports_invalid_patterns() {
        let mut table = RouteTable::default();
        let err = Router::new().get("/files/**/x", ok).attach(&mut table, "").unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[test]
    fn empty_pattern_is_rejected_not_rooted() {
        let mut table = RouteTable::default();
        let err = Router::new().get("", ok).attach(&mut table, "").unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
        assert!(table.lookup(Method::Get, "/").is_none());

        let mut table = RouteTable::default();
        let err = Router::new()
            .mount("/api", Router::new().post("", ok))
            .attach(&mut table, "/v1")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
        assert!(table.lookup(Method::Post, "/v1/api").is_none());
    }

    #[test]
    fn shortcuts_register_their_method() {
        let mut table = RouteTable::default();
        Router::new()
            .put("/x", ok)
            .delete("/x", ok)
            .propfind("/x", ok)
            .r#move("/x", ok)
            .attach(&mut table, "")
            .unwrap();

        for m in [Method::Put, Method::Delete, Method::Propfind, Method::Move] {
            assert!(table.lookup(m, "/x").is_some(), "{m}");
        }
        assert!(table.lookup(Method::Get, "/x").is_none());
    }
}
