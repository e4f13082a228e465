//! Built-in middleware
//!
//! Middleware are ordinary handlers: they run their "before" logic, call
//! [`Context::next`](crate::Context::next) to run the rest of the chain, then
//! run their "after" logic. Not calling `next` ends the chain.

pub mod logger;
pub mod recovery;

// Re-exports for convenience
pub use logger::logger;
pub use recovery::recovery;
