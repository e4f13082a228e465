//! Route registration and per-request resolution
//!
//! Wraps the zephyr-router table with concrete handlers and appends the
//! resolved handler (or the not-found fallback) to a request's chain.

use crate::{Context, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use zephyr_router::RouteTable;

/// Handler and middleware function type
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// A handler that does nothing; registers a route that matches but writes nothing
pub fn noop(_ctx: &mut Context) {}

/// Method-aware route table holding [`HandlerFunc`]s
#[derive(Default, Clone)]
pub struct Router {
    table: RouteTable<HandlerFunc>,
}

/// Resolved route for a request
#[derive(Clone)]
pub struct RouteMatch {
    /// Pattern that matched
    pub pattern: String,
    /// Handler registered for the pattern
    pub handler: HandlerFunc,
    /// Captured path parameters
    pub params: HashMap<String, String>,
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route; a repeated `(method, pattern)` keeps the first handler
    pub fn add_route(&mut self, method: &str, pattern: &str, handler: HandlerFunc) {
        if self.table.add_route(method, pattern, handler) {
            tracing::debug!(method, pattern, "route registered");
        }
    }

    /// Resolve a request
    pub fn get_route(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let matched = self.table.get_route(method, path)?;
        let handler = self.table.handler(method, matched.pattern)?.clone();
        Some(RouteMatch {
            pattern: matched.pattern.to_string(),
            handler,
            params: matched.params,
        })
    }

    /// Finish building the chain for `ctx` and start it.
    ///
    /// The not-found fallback is an ordinary handler, so middleware sees it
    /// like any route handler.
    pub fn handle(&self, ctx: &mut Context) {
        match self.get_route(&ctx.method, &ctx.path) {
            Some(matched) => {
                ctx.params = matched.params;
                ctx.push_handlers([matched.handler]);
            }
            None => ctx.push_handlers([Arc::new(not_found) as HandlerFunc]),
        }
        ctx.next();
    }

    /// Number of registered `(method, pattern)` pairs
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no route has been registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn not_found(ctx: &mut Context) {
    let body = format!("<path not found>, method:{}, path:{}", ctx.method, ctx.path);
    ctx.string(StatusCode::NOT_FOUND, body);
}
