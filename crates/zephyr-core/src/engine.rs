//! Engine and route groups
//!
//! The [`Engine`] owns the router and a flat list of [`Group`]s. The first
//! group is the engine's own, with an empty prefix; the engine forwards its
//! registration calls to it.
//!
//! For each request every group whose prefix is a string prefix of the path
//! contributes its middleware, in the order the groups were created. Group
//! nesting only builds prefixes; it plays no part in that selection.

use crate::handlers::{StaticFileConfig, StaticFiles};
use crate::middleware::recovery;
use crate::{Context, HandlerFunc, Request, Response, Router, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;

/// Path-prefix scope with its own middleware
#[derive(Clone)]
pub struct Group {
    prefix: String,
    middleware: Vec<HandlerFunc>,
    parent: Option<usize>,
}

impl Group {
    /// Full prefix of the group
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Index of the enclosing group in [`Engine::groups`]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Number of middleware registered on this group
    pub fn middleware_len(&self) -> usize {
        self.middleware.len()
    }
}

/// Request dispatcher
///
/// Built once at startup; serving takes it by `Arc` so the route table and
/// groups are read-only while requests are handled.
#[derive(Clone)]
pub struct Engine {
    router: Router,
    groups: Vec<Group>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with no middleware
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            groups: vec![Group {
                prefix: String::new(),
                middleware: Vec::new(),
                parent: None,
            }],
        }
    }

    /// Create an engine with [`recovery`] installed as the first middleware
    pub fn with_recovery() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(recovery());
        engine
    }

    /// The engine's own group (empty prefix)
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup {
            engine: self,
            index: 0,
        }
    }

    /// All groups in creation order, the engine's own first
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The route table
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Create a group under the engine's own group
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        self.root().into_group(prefix)
    }

    /// Add middleware applied to every request
    pub fn use_middleware(&mut self, middleware: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.root().use_middleware(middleware);
    }

    /// Register a handler for any method
    pub fn add_route(
        &mut self,
        method: &str,
        path: &str,
        handler: impl Fn(&mut Context) + Send + Sync + 'static,
    ) {
        self.root().add_route(method, path, handler);
    }

    /// Register a GET route
    pub fn get(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("GET", path, handler);
    }

    /// Register a POST route
    pub fn post(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("POST", path, handler);
    }

    /// Register a PUT route
    pub fn put(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("PUT", path, handler);
    }

    /// Register a DELETE route
    pub fn delete(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("DELETE", path, handler);
    }

    /// Register a PATCH route
    pub fn patch(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("PATCH", path, handler);
    }

    /// Register an OPTIONS route
    pub fn options(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("OPTIONS", path, handler);
    }

    /// Register a HEAD route
    pub fn head(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("HEAD", path, handler);
    }

    /// Serve files below `root` at `relative_path`
    pub fn static_files(&mut self, relative_path: &str, root: impl Into<PathBuf>) {
        self.root().static_files(relative_path, root);
    }

    /// Serve files at `relative_path` with an explicit [`StaticFileConfig`]
    pub fn static_files_with(&mut self, relative_path: &str, config: StaticFileConfig) {
        self.root().static_files_with(relative_path, config);
    }

    /// Middleware that applies to `path`, in group creation order
    pub fn middleware_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|group| path.starts_with(&group.prefix))
            .flat_map(|group| group.middleware.iter().cloned())
            .collect()
    }

    /// Run one request through its middleware chain and route handler
    pub fn handle(&self, request: Request) -> Response {
        let mut ctx = Context::new(request);
        ctx.push_handlers(self.middleware_for(&ctx.path));
        self.router.handle(&mut ctx);
        ctx.into_response()
    }
}

/// Handle for registering routes and middleware on one group
pub struct RouterGroup<'a> {
    engine: &'a mut Engine,
    index: usize,
}

impl<'a> RouterGroup<'a> {
    fn group_mut(&mut self) -> &mut Group {
        &mut self.engine.groups[self.index]
    }

    /// Full prefix of this group
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.index].prefix
    }

    fn create_child(engine: &mut Engine, parent: usize, prefix: &str) -> usize {
        let prefix = format!("{}{}", engine.groups[parent].prefix, prefix);
        engine.groups.push(Group {
            prefix,
            middleware: Vec::new(),
            parent: Some(parent),
        });
        engine.groups.len() - 1
    }

    /// Create a nested group; its prefix is this group's prefix plus `prefix`
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let index = Self::create_child(self.engine, self.index, prefix);
        RouterGroup {
            engine: &mut *self.engine,
            index,
        }
    }

    /// Like [`group`](Self::group) but consumes this handle
    pub fn into_group(self, prefix: &str) -> RouterGroup<'a> {
        let index = Self::create_child(self.engine, self.index, prefix);
        RouterGroup {
            engine: self.engine,
            index,
        }
    }

    /// Add middleware for every request under this group's prefix
    pub fn use_middleware(&mut self, middleware: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.group_mut().middleware.push(Arc::new(middleware));
    }

    /// Register a handler for any method; the group prefix is prepended
    pub fn add_route(
        &mut self,
        method: &str,
        path: &str,
        handler: impl Fn(&mut Context) + Send + Sync + 'static,
    ) {
        self.add_handler(method, path, Arc::new(handler));
    }

    fn add_handler(&mut self, method: &str, path: &str, handler: HandlerFunc) {
        let pattern = format!("{}{}", self.prefix(), path);
        self.engine.router.add_route(method, &pattern, handler);
    }

    /// Register a GET route
    pub fn get(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("GET", path, handler);
    }

    /// Register a POST route
    pub fn post(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("POST", path, handler);
    }

    /// Register a PUT route
    pub fn put(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("PUT", path, handler);
    }

    /// Register a DELETE route
    pub fn delete(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("DELETE", path, handler);
    }

    /// Register a PATCH route
    pub fn patch(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("PATCH", path, handler);
    }

    /// Register an OPTIONS route
    pub fn options(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("OPTIONS", path, handler);
    }

    /// Register a HEAD route
    pub fn head(&mut self, path: &str, handler: impl Fn(&mut Context) + Send + Sync + 'static) {
        self.add_route("HEAD", path, handler);
    }

    /// Serve files below `root` at `relative_path` + `/*filepath`.
    ///
    /// A `filepath` that does not name an existing file answers 404 with an
    /// empty body instead of falling through to the route-not-found text.
    pub fn static_files(&mut self, relative_path: &str, root: impl Into<PathBuf>) {
        self.static_files_with(relative_path, StaticFileConfig::new(root));
    }

    /// Like [`static_files`](Self::static_files) with explicit index, caching
    /// and header settings. Registers both GET and HEAD.
    pub fn static_files_with(&mut self, relative_path: &str, config: StaticFileConfig) {
        let files = StaticFiles::new(config);
        let pattern = join_paths(relative_path, "/*filepath");

        let handler: HandlerFunc = Arc::new(move |ctx: &mut Context| {
            let file = ctx.param("filepath").unwrap_or_default();
            match files.resolve(file) {
                Some(path) => {
                    let response = files.serve_file(&path, &ctx.request);
                    ctx.status(response.status);
                    for (name, value) in response.headers {
                        ctx.set_header(&name, value);
                    }
                    ctx.write(&response.body);
                }
                None => ctx.status(StatusCode::NOT_FOUND),
            }
        });
        self.add_handler("GET", &pattern, Arc::clone(&handler));
        self.add_handler("HEAD", &pattern, handler);
    }
}

/// Join two URL paths with exactly one slash between them
fn join_paths(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    if base.is_empty() {
        format!("/{rest}")
    } else {
        format!("{base}/{rest}")
    }
}
