//! Request logging middleware
//!
//! Logs method, path, final status and elapsed time once the rest of the
//! chain has finished.

use crate::Context;
use std::time::Instant;

/// Create the request logger
pub fn logger() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();
        let elapsed = start.elapsed();

        tracing::info!(
            method = %ctx.method,
            path = %ctx.path,
            status = ctx.status_code().as_u16(),
            elapsed_us = elapsed.as_micros() as u64,
            "request handled"
        );
    }
}
