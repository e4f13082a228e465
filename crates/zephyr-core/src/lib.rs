//! zephyr-core: middleware-dispatch HTTP framework
//!
//! An [`Engine`] resolves each request against its route table, collects the
//! middleware of every group whose prefix matches the path, and runs them in
//! order followed by the route handler. Each handler receives the request
//! [`Context`] and decides whether the chain continues by calling
//! [`Context::next`].
//!
//! ```
//! use zephyr_core::{Context, Engine, Request, StatusCode};
//!
//! let mut engine = Engine::with_recovery();
//! engine.get("/hello/:name", |ctx: &mut Context| {
//!     let body = format!("hello {}", ctx.param("name").unwrap_or_default());
//!     ctx.string(StatusCode::OK, body);
//! });
//!
//! let res = engine.handle(Request::new("GET", "/hello/geek"));
//! assert_eq!(res.body_string().as_deref(), Some("hello geek"));
//! ```
//!
//! ## Features
//! - `native` - hyper/tokio server (`Engine::run`)

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod context;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;

#[cfg(feature = "native")]
pub mod server;

// Re-exports
pub use context::Context;
pub use engine::{Engine, Group, RouterGroup};
pub use error::{Error, Result};
pub use request::{Request, RequestBuilder};
pub use response::{Response, StatusCode};
pub use router::{noop, HandlerFunc, RouteMatch, Router};

// Middleware re-exports
pub use middleware::{logger, recovery};

// Handlers re-exports
pub use handlers::{StaticFileConfig, StaticFiles};

#[cfg(feature = "native")]
pub use server::{create_optimized_socket, from_hyper_request, serve, to_hyper_response, ServerConfig};
