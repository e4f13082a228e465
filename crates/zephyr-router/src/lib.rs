//! zephyr-router: Zero-dependency prefix tree HTTP router
//!
//! Route table used by zephyr-core to resolve `(method, path)` into a
//! registered pattern and its captured parameters.
//!
//! ## Path Syntax
//! - `name` - Literal segment
//! - `:name` - Named parameter (captures one segment)
//! - `*` or `*name` - Wildcard (captures remaining path, bare `*` captures nothing)
//!
//! Anything after the first wildcard token of a pattern is ignored.
//!
//! ## Matching
//! Children of a tree node are tried in insertion order and the first branch
//! that reaches a registered route wins. There is no static-over-param
//! priority beyond that order.
//!
//! ## Example
//! ```
//! use zephyr_router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.add_route("GET", "/users/:id", 1);
//! table.add_route("GET", "/files/*path", 2);
//!
//! let m = table.get_route("GET", "/users/42").unwrap();
//! assert_eq!(m.pattern, "/users/:id");
//! assert_eq!(m.params["id"], "42");
//! assert_eq!(table.handler("GET", m.pattern), Some(&1));
//! ```

mod tree;

pub use tree::Node;

use std::collections::HashMap;

/// One `/`-delimited token of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matched verbatim
    Literal(String),
    /// `:name`, binds one segment
    Param(String),
    /// `*name`, binds the rest of the path
    Wildcard(String),
}

impl Segment {
    fn from_token(token: &str) -> Self {
        if let Some(name) = token.strip_prefix('*') {
            Segment::Wildcard(name.to_string())
        } else if let Some(name) = token.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else {
            Segment::Literal(token.to_string())
        }
    }

    /// The token as written in the pattern
    pub fn raw(&self) -> String {
        match self {
            Segment::Literal(text) => text.clone(),
            Segment::Param(name) => format!(":{name}"),
            Segment::Wildcard(name) => format!("*{name}"),
        }
    }
}

/// Split a pattern (or request path) into segments.
///
/// Empty tokens are dropped, so leading, trailing and doubled slashes are
/// tolerated. Parsing stops after the first wildcard.
///
/// ```
/// use zephyr_router::{parse_pattern, Segment};
///
/// assert_eq!(
///     parse_pattern("/p/*name/*"),
///     vec![Segment::Literal("p".into()), Segment::Wildcard("name".into())]
/// );
/// ```
pub fn parse_pattern(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for token in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = Segment::from_token(token);
        let is_wildcard = matches!(segment, Segment::Wildcard(_));
        segments.push(segment);
        if is_wildcard {
            break;
        }
    }
    segments
}

/// Route match result
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    /// The registered pattern that matched
    pub pattern: &'a str,
    /// Captured path parameters
    pub params: HashMap<String, String>,
}

/// Per-method prefix trees plus the handler registered for each pattern
///
/// Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    /// `"METHOD-pattern"` -> handler, first registration wins
    handlers: HashMap<String, H>,
    /// Method -> tree root
    trees: HashMap<String, Node>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            trees: HashMap::new(),
        }
    }
}

fn route_key(method: &str, pattern: &str) -> String {
    format!("{method}-{pattern}")
}

impl<H> RouteTable<H> {
    /// Create an empty route table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` + `pattern`.
    ///
    /// Returns `false` when the key was already taken; the earlier handler
    /// is kept. The tree insertion happens either way.
    pub fn add_route(&mut self, method: &str, pattern: &str, handler: H) -> bool {
        let key = route_key(method, pattern);

        let added = !self.handlers.contains_key(&key);
        if added {
            self.handlers.insert(key, handler);
        }

        let segments = parse_pattern(pattern);
        self.trees
            .entry(method.to_string())
            .or_default()
            .insert(pattern, &segments, 0);
        added
    }

    /// Resolve a request path into the registered pattern and its params
    pub fn get_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.trees.get(method)?;
        let search: Vec<String> = parse_pattern(path).iter().map(Segment::raw).collect();
        let parts: Vec<&str> = search.iter().map(String::as_str).collect();

        let node = root.search(&parts, 0)?;
        let mut params = HashMap::new();
        for (index, segment) in parse_pattern(node.pattern()).into_iter().enumerate() {
            match segment {
                Segment::Param(name) => {
                    if let Some(value) = parts.get(index) {
                        params.insert(name, (*value).to_string());
                    }
                }
                Segment::Wildcard(name) => {
                    if !name.is_empty() {
                        params.insert(name, parts.get(index..).unwrap_or_default().join("/"));
                    }
                    break;
                }
                Segment::Literal(_) => {}
            }
        }

        Some(RouteMatch {
            pattern: node.pattern(),
            params,
        })
    }

    /// Handler registered for exactly `method` + `pattern`
    pub fn handler(&self, method: &str, pattern: &str) -> Option<&H> {
        self.handlers.get(&route_key(method, pattern))
    }

    /// Check if a method has any routes registered
    pub fn has_method(&self, method: &str) -> bool {
        self.trees.contains_key(method)
    }

    /// Number of distinct `(method, pattern)` registrations
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no route has been registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_test_table() -> RouteTable<Option<u32>> {
        let mut table = RouteTable::new();
        table.add_route("GET", "/", None);
        table.add_route("GET", "/hello/:name", None);
        table.add_route("GET", "/hello/b/c", None);
        table.add_route("GET", "/hi/:name", None);
        table.add_route("GET", "/assets/*filepath", None);
        table
    }

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_string())
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(
            parse_pattern("/p/:name"),
            vec![lit("p"), Segment::Param("name".to_string())]
        );
        assert_eq!(
            parse_pattern("/p/*"),
            vec![lit("p"), Segment::Wildcard(String::new())]
        );
        assert_eq!(
            parse_pattern("/p/*name/*"),
            vec![lit("p"), Segment::Wildcard("name".to_string())]
        );
    }

    #[test]
    fn test_parse_tolerates_slashes() {
        assert_eq!(parse_pattern("//a///b/"), vec![lit("a"), lit("b")]);
        assert!(parse_pattern("/").is_empty());
        assert!(parse_pattern("").is_empty());
    }

    #[test]
    fn test_segment_raw() {
        assert_eq!(lit("p").raw(), "p");
        assert_eq!(Segment::Param("id".into()).raw(), ":id");
        assert_eq!(Segment::Wildcard(String::new()).raw(), "*");
    }

    #[test]
    fn test_get_route_param() {
        let table = new_test_table();
        let m = table.get_route("GET", "/hello/b").unwrap();
        assert_eq!(m.pattern, "/hello/:name");
        assert_eq!(m.params.get("name").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_get_route_literal() {
        let table = new_test_table();
        let m = table.get_route("GET", "/hello/b/c").unwrap();
        assert_eq!(m.pattern, "/hello/b/c");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_get_route_literal_registered_first() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/hello/b/c", 2);
        table.add_route("GET", "/hello/:name", 1);

        assert_eq!(table.get_route("GET", "/hello/b/c").unwrap().pattern, "/hello/b/c");
        assert_eq!(table.get_route("GET", "/hello/b").unwrap().pattern, "/hello/:name");
    }

    #[test]
    fn test_get_route_wildcard() {
        let table = new_test_table();
        let m = table.get_route("GET", "/assets/css/a.css").unwrap();
        assert_eq!(m.pattern, "/assets/*filepath");
        assert_eq!(m.params.get("filepath").map(String::as_str), Some("css/a.css"));
    }

    #[test]
    fn test_bare_wildcard_binds_nothing() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/static/*", 1);

        let m = table.get_route("GET", "/static/js/app.js").unwrap();
        assert_eq!(m.pattern, "/static/*");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_root_route() {
        let table = new_test_table();
        assert_eq!(table.get_route("GET", "/").unwrap().pattern, "/");
    }

    #[test]
    fn test_no_match() {
        let table = new_test_table();
        assert!(table.get_route("GET", "/nope").is_none());
        assert!(table.get_route("POST", "/hello/b").is_none());
    }

    #[test]
    fn test_duplicate_keeps_first_handler() {
        let mut table = RouteTable::new();
        assert!(table.add_route("GET", "/users", 1));
        assert!(!table.add_route("GET", "/users", 2));

        let m = table.get_route("GET", "/users").unwrap();
        assert_eq!(table.handler("GET", m.pattern), Some(&1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_handler_still_matches() {
        let table = new_test_table();
        let m = table.get_route("GET", "/hi/tom").unwrap();
        assert_eq!(table.handler("GET", m.pattern), Some(&None));
    }

    #[test]
    fn test_repeated_registration_is_idempotent() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/hi/:name", 7);
        let before = table.get_route("GET", "/hi/tom").unwrap();
        let before = (before.pattern.to_string(), before.params);

        table.add_route("GET", "/hi/:name", 7);
        let after = table.get_route("GET", "/hi/tom").unwrap();
        assert_eq!((after.pattern.to_string(), after.params), before);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_wildcard_truncates_pattern() {
        let mut table = RouteTable::new();
        table.add_route("GET", "/p/*name/ignored", 1);

        let m = table.get_route("GET", "/p/x/y").unwrap();
        assert_eq!(m.params.get("name").map(String::as_str), Some("x/y"));
    }

    #[test]
    fn test_method_keys_are_exact() {
        let mut table = RouteTable::new();
        table.add_route("get", "/users", 1);
        table.add_route("GET", "/users", 2);

        assert!(table.has_method("get"));
        assert!(table.has_method("GET"));
        assert!(!table.has_method("Get"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.handler("get", "/users"), Some(&1));
        assert_eq!(table.handler("GET", "/users"), Some(&2));
        assert!(table.get_route("Get", "/users").is_none());
    }
}
