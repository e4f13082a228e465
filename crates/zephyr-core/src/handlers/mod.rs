//! Built-in request handlers
//!
//! File-serving collaborator behind [`RouterGroup::static_files`](crate::RouterGroup::static_files).

pub mod static_files;

pub use static_files::{StaticFileConfig, StaticFiles};
