//! Handler-chain execution.
//!
//! A dispatch walks one request through its chain with an index cursor. Each
//! handler receives a [`Next`] pointing one past itself and decides what
//! happens:
//!
//! ```text
//!              ┌──────── res ready ────────────┐
//! run(i) ──▶ handler[i](req, res, Next(i+1)) ──┼──▶ Ok(res)      finished
//!              │                               ├──▶ Err(e)       aborted
//!              └── next.run(req, res) ──▶ run(i+1)
//! ```
//!
//! The engine never awaits anything on its own. Progress is driven entirely
//! by handlers calling [`Next::run`] or returning. A chain that runs out of
//! handlers hands back the response untouched; [`App::handle`](crate::App::handle)
//! reports that as [`Error::Incomplete`](crate::Error::Incomplete).

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::trace;

use crate::error::HandlerError;
use crate::handler::{BoxedHandler, Chain, HandlerResult};
use crate::request::Request;
use crate::response::Response;

/// The continuation handed to every handler.
///
/// Calling [`run`](Next::run) invokes the rest of the chain. Not calling it
/// ends the chain with whatever the handler returns.
pub struct Next {
    chain: Arc<[BoxedHandler]>,
    index: usize,
}

impl Next {
    pub(crate) fn start(chain: Arc<[BoxedHandler]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Handlers left to run after this point.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Runs the rest of the chain.
    ///
    /// Returns immediately when `res` is already finalized, so a middleware
    /// may always call `next.run` without checking. A panic inside a handler
    /// is turned into a `500` [`HandlerError`].
    pub async fn run(self, req: Request, res: Response) -> HandlerResult {
        if res.is_ready() {
            return Ok(res);
        }

        let Some(handler) = self.chain.get(self.index).map(Arc::clone) else {
            trace!(len = self.chain.len(), "handler chain exhausted");
            return Ok(res);
        };

        let next = Self { chain: self.chain, index: self.index + 1 };

        // Handlers may panic while building their future or while it runs.
        let fut = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(req, res, next))) {
            Ok(fut) => fut,
            Err(payload) => return Err(HandlerError::from_panic(payload)),
        };

        AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

/// Runs `chain` against a request from its first handler.
///
/// Resolves with the response once a handler finalizes it, or with the
/// unfinished response if the chain is exhausted first. Any handler error is
/// returned as-is and stops the chain.
pub async fn execute(chain: impl Into<Chain>, req: Request, res: Response) -> HandlerResult {
    let chain: Arc<[BoxedHandler]> = chain.into().into_vec().into();
    Next::start(chain).run(req, res).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::StatusCode;

    use super::*;
    use crate::handler::{BoxFuture, sync_fn};
    use crate::handlers;
    use crate::method::Method;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn request() -> Request {
        Request::new(Method::Get, "/")
    }

    /// A middleware that records its name and continues.
    fn step(log: &Log, name: &'static str) -> impl Fn(Request, Response, Next) -> BoxFuture + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |req: Request, res: Response, next: Next| {
            let log = Arc::clone(&log);
            let fut: BoxFuture = Box::pin(async move {
                log.lock().unwrap().push(name);
                next.run(req, res).await
            });
            fut
        }
    }

    /// A terminal handler that records its name and finalizes.
    fn finish(log: &Log, name: &'static str) -> impl Fn(Request, Response, Next) -> BoxFuture + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_req: Request, mut res: Response, _next: Next| {
            let log = Arc::clone(&log);
            let fut: BoxFuture = Box::pin(async move {
                log.lock().unwrap().push(name);
                res.text(name);
                Ok::<_, HandlerError>(res)
            });
            fut
        }
    }

    #[tokio::test]
    async fn runs_handlers_in_order() {
        let log = Log::default();
        let chain = handlers![step(&log, "a"), step(&log, "b"), finish(&log, "c")];

        let res = execute(chain, request(), Response::new()).await.unwrap();

        assert!(res.is_ready());
        assert_eq!(res.body().unwrap(), b"c");
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn finalized_response_short_circuits() {
        let log = Log::default();
        let chain = handlers![finish(&log, "h1"), finish(&log, "h2")];

        let res = execute(chain, request(), Response::new()).await.unwrap();

        assert_eq!(res.body().unwrap(), b"h1");
        assert_eq!(*log.lock().unwrap(), ["h1"]);
    }

    #[tokio::test]
    async fn error_stops_the_chain() {
        let log = Log::default();
        let fail = |_req: Request, _res: Response, _next: Next| async move {
            Err::<Response, _>(HandlerError::with_status(StatusCode::FORBIDDEN, "x"))
        };
        let chain = handlers![step(&log, "a"), fail, finish(&log, "never")];

        let err = execute(chain, request(), Response::new()).await.unwrap_err();

        assert_eq!(err.message(), "x");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(*log.lock().unwrap(), ["a"]);
    }

    #[tokio::test]
    async fn exhausted_chain_returns_unready_response() {
        let log = Log::default();
        let chain = handlers![step(&log, "a"), step(&log, "b")];

        let res = execute(chain, request(), Response::new()).await.unwrap();

        assert!(!res.is_ready());
        assert_eq!(*log.lock().unwrap(), ["a", "b"]);
    }

    #[tokio::test]
    async fn middleware_can_post_process() {
        let wrap = |req: Request, res: Response, next: Next| async move {
            let mut res = next.run(req, res).await?;
            // Finalized responses ignore mutation.
            res.set_header("x-after", "1");
            Ok::<_, HandlerError>(res)
        };
        let log = Log::default();
        let chain = handlers![wrap, finish(&log, "done")];

        let res = execute(chain, request(), Response::new()).await.unwrap();

        assert_eq!(res.header("x-after"), None);
    }

    #[tokio::test]
    async fn sync_handlers_continue_the_chain() {
        let log = Log::default();
        let tag = sync_fn(|_req, res| {
            res.set_header("x-tag", "sync");
            Ok(())
        });
        let chain = handlers![tag, finish(&log, "end")];

        let res = execute(chain, request(), Response::new()).await.unwrap();

        assert_eq!(res.header("x-tag"), Some("sync"));
        assert_eq!(*log.lock().unwrap(), ["end"]);
    }

    #[tokio::test]
    async fn sync_handler_error_aborts() {
        let log = Log::default();
        let deny = sync_fn(|_req, _res| Err(HandlerError::from("denied")));

        let err = execute(handlers![deny, finish(&log, "never")], request(), Response::new())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "denied");
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn panics_become_handler_errors() {
        let boom = |_req: Request, _res: Response, _next: Next| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, HandlerError>(Response::new())
        };

        let err = execute(boom, request(), Response::new()).await.unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "handler panicked: kaboom");
    }

    #[tokio::test]
    async fn next_reports_remaining_handlers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let probe = {
            let seen = Arc::clone(&seen);
            move |req: Request, res: Response, next: Next| {
                seen.lock().unwrap().push(next.remaining());
                next.run(req, res)
            }
        };
        let probe2 = probe.clone();

        execute(handlers![probe, probe2], request(), Response::new()).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), [1, 0]);
    }
}
