//! The application routing table: one [`RouteTree`] per method.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::tree::{Match, RouteTree};

/// Destination for routes leaving a [`Router`](crate::Router).
///
/// [`Router::attach`](crate::Router::attach) calls `register` once per
/// pending route with its full path and composed handler chain.
pub trait Register {
    fn register(&mut self, path: &str, method: Method, handlers: Vec<BoxedHandler>) -> Result<(), Error>;
}

/// Route trees keyed by method, created on first use.
///
/// Built at startup, then only read. Concurrent lookups need no locking.
pub struct RouteTable {
    trees: HashMap<Method, RouteTree>,
    strip_trailing_slash: bool,
}

impl RouteTable {
    pub fn new(strip_trailing_slash: bool) -> Self {
        Self { trees: HashMap::new(), strip_trailing_slash }
    }

    /// Resolves `path` in the tree for `method`.
    pub fn lookup(&self, method: Method, path: &str) -> Option<Match> {
        self.trees.get(&method)?.resolve(path)
    }

    /// Methods that have at least one route.
    pub fn methods(&self) -> impl Iterator<Item = Method> + '_ {
        self.trees.keys().copied()
    }
}

impl Register for RouteTable {
    fn register(&mut self, path: &str, method: Method, handlers: Vec<BoxedHandler>) -> Result<(), Error> {
        let count = handlers.len();
        let strip = self.strip_trailing_slash;
        self.trees
            .entry(method)
            .or_insert_with(|| RouteTree::new(strip))
            .add_route(path, handlers)?;
        debug!(%method, path, handlers = count, "route registered");
        Ok(())
    }
}

impl Default for RouteTable {
    fn default() -> Self { Self::new(true) }
}
