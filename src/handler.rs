//! Handler trait, type erasure and handler chains.
//!
//! # How handlers are stored
//!
//! A route's chain mixes handlers of *different* concrete types: a logging
//! middleware, an auth check, the endpoint itself. Rust collections hold one
//! type, so every handler is erased behind `dyn ErasedHandler` and stored as an
//! `Arc`:
//!
//! ```text
//! async fn show(req, res, next) -> HandlerResult { … }   ← user writes this
//!        ↓ router.get("/", show)  /  handlers![auth, show]
//! show.into_boxed_handler()                             ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                             ← stored as BoxedHandler
//!        ↓
//! handler.call(req, res, next)  at request time         ← one vtable dispatch
//! ```
//!
//! Middleware and endpoints share the signature. The only difference is
//! whether the handler hands the request on with [`Next::run`] or finishes
//! the response itself.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dispatch::Next;
use crate::error::HandlerError;
use crate::request::Request;
use crate::response::Response;

/// What every handler resolves to.
pub type HandlerResult = Result<Response, HandlerError>;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased handler future.
///
/// `Send + 'static` lets tokio move the dispatch across worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, res: Response, next: Next) -> BoxFuture;
}

/// A type-erased handler shared by every request that hits its route.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler or middleware.
///
/// You never implement this yourself. It is satisfied by any `async fn`
/// (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(req: Request, res: Response, next: Next) -> HandlerResult
/// ```
///
/// and by synchronous closures wrapped with [`sync_fn`].
///
/// The trait is **sealed**: only the impls in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Async functions ───────────────────────────────────────────────────────────

impl<F, Fut> private::Sealed for F
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request, res: Response, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, res, next))
    }
}

// ── Synchronous functions ─────────────────────────────────────────────────────

/// Adapts a synchronous closure into a [`Handler`].
///
/// The closure gets mutable access to both contexts. When it returns `Ok`,
/// the chain continues; if it finalized the response, the next step stops
/// there. Returning `Err` aborts the chain.
///
/// ```rust
/// use ovenjoy::{Router, handler::sync_fn};
///
/// let router = Router::new()
///     .middleware(sync_fn(|_req, res| {
///         res.set_header("x-powered-by", "ovenjoy");
///         Ok(())
///     }))
///     .get("/ping", sync_fn(|_req, res| {
///         res.text("pong");
///         Ok(())
///     }));
/// ```
pub fn sync_fn<F>(f: F) -> SyncHandler<F>
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    SyncHandler(f)
}

/// A synchronous closure adapted by [`sync_fn`].
pub struct SyncHandler<F>(F);

impl<F> private::Sealed for SyncHandler<F> where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static
{
}

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<F> ErasedHandler for SyncHandler<F>
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync,
{
    fn call(&self, mut req: Request, mut res: Response, next: Next) -> BoxFuture {
        match (self.0)(&mut req, &mut res) {
            Ok(()) => Box::pin(next.run(req, res)),
            Err(e) => Box::pin(std::future::ready(Err(e))),
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of handlers, run front to back.
///
/// A single handler converts into a one-element chain; build longer ones with
/// [`Chain::then`] or the [`handlers!`](crate::handlers) macro.
#[derive(Clone, Default)]
pub struct Chain(Vec<BoxedHandler>);

impl Chain {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a handler. Returns `self` for chaining.
    pub fn then(mut self, handler: impl Handler) -> Self {
        self.0.push(handler.into_boxed_handler());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<BoxedHandler> {
        self.0
    }
}

impl<H: Handler> From<H> for Chain {
    fn from(handler: H) -> Self {
        Self::new().then(handler)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("handlers", &self.0.len()).finish()
    }
}

/// Builds a [`Chain`] from handlers of different types.
///
/// ```rust
/// # use ovenjoy::{handlers, HandlerResult, Next, Request, Response, Router};
/// # async fn auth(req: Request, res: Response, next: Next) -> HandlerResult { next.run(req, res).await }
/// # async fn dashboard(_: Request, mut res: Response, _: Next) -> HandlerResult { res.text("hi"); Ok(res) }
/// let router = Router::new().get("/admin", handlers![auth, dashboard]);
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),+ $(,)?) => {
        $crate::Chain::new()$(.then($handler))+
    };
}
