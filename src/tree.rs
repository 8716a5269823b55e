//! Per-method radix tree over path segments.
//!
//! Each node may have any number of static children, at most one placeholder
//! child (`:name`) and at most one wildcard child (`**`). Lookups try, per
//! segment, the static child first, then the placeholder. The wildcard is a
//! deferred fallback: the walk remembers the last wildcard it passed and
//! uses it only when the walk itself does not end on a route.
//!
//! Routes without placeholders or wildcards are also kept in an exact-match
//! table, so most lookups are a single hash probe.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::path;

/// A registered route: its pattern and handler chain.
pub struct RouteData {
    pattern: String,
    pub(crate) handlers: Arc<[BoxedHandler]>,
}

impl RouteData {
    /// The pattern as it was registered, e.g. `/users/:id`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for RouteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteData")
            .field("pattern", &self.pattern)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// The result of a successful lookup.
#[derive(Debug, Clone)]
pub struct Match {
    pub route: Arc<RouteData>,
    /// `Some` only when a placeholder took part in the match.
    pub params: Option<HashMap<String, String>>,
}

#[derive(Default)]
struct Node {
    statics: HashMap<String, Node>,
    placeholder: Option<Box<Node>>,
    wildcard: Option<Box<Node>>,
    param: String,
    route: Option<Arc<RouteData>>,
}

enum Segment<'a> {
    Static(&'a str),
    Placeholder(&'a str),
    Wildcard,
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Self::Placeholder(name)
        } else if raw == "**" {
            Self::Wildcard
        } else {
            Self::Static(raw)
        }
    }
}

/// The route tree for one HTTP method.
pub struct RouteTree {
    root: Node,
    exact: HashMap<String, Arc<RouteData>>,
    strip_trailing_slash: bool,
}

impl RouteTree {
    /// `strip_trailing_slash` makes `/a/` and `/a` the same route.
    pub fn new(strip_trailing_slash: bool) -> Self {
        Self { root: Node::default(), exact: HashMap::new(), strip_trailing_slash }
    }

    /// Registers `pattern`, replacing any route already stored at the same
    /// position.
    ///
    /// Fails without touching the tree if the pattern is empty, a placeholder
    /// has no name, `**` is not the last segment, or a placeholder name
    /// clashes with a different one already registered at that position.
    pub fn add_route(&mut self, pattern: &str, handlers: Vec<BoxedHandler>) -> Result<(), Error> {
        if pattern.is_empty() {
            return Err(Error::invalid_route(pattern, "pattern must not be empty"));
        }

        let normalized = path::normalize(pattern, self.strip_trailing_slash);
        let raw: Vec<&str> = path::segments(normalized).collect();
        let segments: Vec<Segment<'_>> = raw.iter().copied().map(Segment::parse).collect();
        self.check(pattern, &segments)?;

        let route = Arc::new(RouteData { pattern: pattern.to_owned(), handlers: handlers.into() });
        let mut is_static = true;
        let mut node = &mut self.root;

        for segment in &segments {
            node = match *segment {
                Segment::Static(text) => node.statics.entry(text.to_owned()).or_default(),
                Segment::Placeholder(name) => {
                    is_static = false;
                    &mut **node.placeholder.get_or_insert_with(|| {
                        Box::new(Node { param: name.to_owned(), ..Node::default() })
                    })
                }
                Segment::Wildcard => {
                    is_static = false;
                    &mut **node.wildcard.get_or_insert_with(Box::default)
                }
            };
        }

        node.route = Some(Arc::clone(&route));
        if is_static {
            self.exact.insert(path::canonical(raw), route);
        }
        Ok(())
    }

    /// Validates segments against the pattern syntax and the existing tree.
    fn check(&self, pattern: &str, segments: &[Segment<'_>]) -> Result<(), Error> {
        let mut node = Some(&self.root);

        for (i, segment) in segments.iter().enumerate() {
            node = match *segment {
                Segment::Static(text) => node.and_then(|n| n.statics.get(text)),
                Segment::Placeholder("") => {
                    return Err(Error::invalid_route(pattern, "placeholder needs a name"));
                }
                Segment::Placeholder(name) => {
                    let existing = node.and_then(|n| n.placeholder.as_deref());
                    if existing.is_some_and(|p| p.param != name) {
                        return Err(Error::invalid_route(
                            pattern,
                            "placeholder name conflicts with an existing route",
                        ));
                    }
                    existing
                }
                Segment::Wildcard if i + 1 != segments.len() => {
                    return Err(Error::invalid_route(pattern, "`**` must be the last segment"));
                }
                Segment::Wildcard => node.and_then(|n| n.wildcard.as_deref()),
            };
        }
        Ok(())
    }

    /// Finds the route for a request path.
    pub fn resolve(&self, path: &str) -> Option<Match> {
        let path = path::normalize(path, self.strip_trailing_slash);

        if let Some(route) = self.exact.get(path) {
            return Some(Match { route: Arc::clone(route), params: None });
        }

        let mut params = HashMap::new();
        let mut params_used = false;
        let mut wildcard = None;
        let mut node = Some(&self.root);

        for segment in path::segments(path) {
            let Some(current) = node else { break };

            if let Some(w) = current.wildcard.as_deref() {
                wildcard = Some(w);
            }

            node = match current.statics.get(segment) {
                Some(next) => Some(next),
                None => current.placeholder.as_deref().inspect(|next| {
                    params.insert(next.param.clone(), segment.to_owned());
                    params_used = true;
                }),
            };
        }

        let route = node
            .and_then(|n| n.route.as_ref())
            .or_else(|| wildcard.and_then(|w| w.route.as_ref()))?;

        Some(Match { route: Arc::clone(route), params: params_used.then_some(params) })
    }
}

impl Default for RouteTree {
    fn default() -> Self { Self::new(true) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Next;
    use crate::handler::{Chain, HandlerResult};
    use crate::request::Request;
    use crate::response::Response;

    async fn noop(_req: Request, res: Response, _next: Next) -> HandlerResult {
        Ok(res)
    }

    fn chain(n: usize) -> Vec<BoxedHandler> {
        (0..n).fold(Chain::new(), |c, _| c.then(noop)).into_vec()
    }

    fn tree(patterns: &[&str]) -> RouteTree {
        let mut tree = RouteTree::default();
        for p in patterns {
            tree.add_route(p, chain(1)).unwrap();
        }
        tree
    }

    fn pattern_of(tree: &RouteTree, path: &str) -> Option<String> {
        tree.resolve(path).map(|m| m.route.pattern().to_owned())
    }

    fn params(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect())
    }

    #[test]
    fn static_routes_use_the_exact_table() {
        let tree = tree(&["/", "/about", "/user/me"]);

        assert!(tree.exact.contains_key("/user/me"));
        let m = tree.resolve("/user/me").unwrap();
        assert_eq!(m.route.pattern(), "/user/me");
        assert_eq!(m.params, None);
        assert_eq!(pattern_of(&tree, "/").as_deref(), Some("/"));
    }

    #[test]
    fn dynamic_routes_stay_out_of_the_exact_table() {
        let tree = tree(&["/user/:name", "/files/**"]);
        assert!(tree.exact.is_empty());
    }

    #[test]
    fn placeholder_binds_segment() {
        let tree = tree(&["/user/:name"]);
        let m = tree.resolve("/user/shubham").unwrap();
        assert_eq!(m.params, params(&[("name", "shubham")]));
    }

    #[test]
    fn multiple_placeholders_bind_in_order() {
        let tree = tree(&["/user/:name/:profession"]);
        let m = tree.resolve("/user/shubham/software-engineer").unwrap();
        assert_eq!(
            m.params,
            params(&[("name", "shubham"), ("profession", "software-engineer")])
        );
    }

    #[test]
    fn static_beats_placeholder() {
        let tree = tree(&["/user/:name", "/user/me"]);

        let m = tree.resolve("/user/me").unwrap();
        assert_eq!(m.route.pattern(), "/user/me");
        assert_eq!(m.params, None);

        let m = tree.resolve("/user/you").unwrap();
        assert_eq!(m.route.pattern(), "/user/:name");
    }

    #[test]
    fn static_wins_even_when_registered_first_at_depth() {
        let tree = tree(&["/user/me/settings", "/user/:name/settings"]);
        assert_eq!(pattern_of(&tree, "/user/me/settings").as_deref(), Some("/user/me/settings"));
        assert_eq!(pattern_of(&tree, "/user/ann/settings").as_deref(), Some("/user/:name/settings"));
    }

    #[test]
    fn trailing_slash_is_ignored_by_default() {
        let tree = tree(&["/user/me", "/user/:name", "/docs/"]);
        assert_eq!(pattern_of(&tree, "/user/me/").as_deref(), Some("/user/me"));
        assert_eq!(pattern_of(&tree, "/user/ann/").as_deref(), Some("/user/:name"));
        assert_eq!(pattern_of(&tree, "/docs").as_deref(), Some("/docs/"));
    }

    #[test]
    fn trailing_slash_is_significant_when_redirect_is_off() {
        let mut tree = RouteTree::new(false);
        tree.add_route("/docs", chain(1)).unwrap();
        tree.add_route("/docs/", chain(2)).unwrap();

        assert_eq!(tree.resolve("/docs").unwrap().route.handler_count(), 1);
        assert_eq!(tree.resolve("/docs/").unwrap().route.handler_count(), 2);
        assert!(tree.resolve("/other/").is_none());
    }

    #[test]
    fn unknown_deeper_path_does_not_match() {
        let tree = tree(&["/user/:name", "/user/me"]);
        assert!(tree.resolve("/user/me/extra").is_none());
        assert!(tree.resolve("/nobody").is_none());
    }

    #[test]
    fn wildcard_matches_any_remainder() {
        let tree = tree(&["/files/**"]);
        assert_eq!(pattern_of(&tree, "/files/a").as_deref(), Some("/files/**"));
        assert_eq!(pattern_of(&tree, "/files/a/b/c").as_deref(), Some("/files/**"));
        assert!(tree.resolve("/files").is_none());
        assert_eq!(tree.resolve("/files/a/b").unwrap().params, None);
    }

    #[test]
    fn wildcard_is_the_last_resort() {
        let tree = tree(&["/files/**", "/files/readme", "/files/:id/raw"]);

        assert_eq!(pattern_of(&tree, "/files/readme").as_deref(), Some("/files/readme"));
        assert_eq!(pattern_of(&tree, "/files/7/raw").as_deref(), Some("/files/:id/raw"));

        // The placeholder branch dead-ends, so the wildcard answers, and the
        // params consulted on the way are kept.
        let m = tree.resolve("/files/7/blame").unwrap();
        assert_eq!(m.route.pattern(), "/files/**");
        assert_eq!(m.params, params(&[("id", "7")]));
    }

    #[test]
    fn deepest_wildcard_seen_wins() {
        let tree = tree(&["/**", "/a/**"]);
        assert_eq!(pattern_of(&tree, "/a/b/c").as_deref(), Some("/a/**"));
        assert_eq!(pattern_of(&tree, "/z/y").as_deref(), Some("/**"));
    }

    #[test]
    fn reregistering_replaces_the_route() {
        let mut tree = RouteTree::default();
        tree.add_route("/a", chain(1)).unwrap();
        tree.add_route("/a/", chain(3)).unwrap();
        assert_eq!(tree.resolve("/a").unwrap().route.handler_count(), 3);
    }

    #[test]
    fn leading_slash_is_optional_in_patterns() {
        let tree = tree(&["users/:id", "health"]);
        assert_eq!(pattern_of(&tree, "/users/1").as_deref(), Some("users/:id"));
        assert_eq!(pattern_of(&tree, "/health").as_deref(), Some("health"));
    }

    #[test]
    fn invalid_patterns_are_rejected() {
        let mut tree = RouteTree::default();
        for bad in ["", "/user/:", "/a/**/b"] {
            let err = tree.add_route(bad, chain(1)).unwrap_err();
            assert!(matches!(err, Error::InvalidRoute { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn conflicting_placeholder_names_are_rejected() {
        let mut tree = tree(&["/user/:name"]);
        let err = tree.add_route("/user/:id/posts", chain(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));

        // Nothing from the failed registration leaked into the tree.
        assert!(tree.resolve("/user/1/posts").is_none());
        assert!(tree.add_route("/user/:name/posts", chain(1)).is_ok());
    }
}
