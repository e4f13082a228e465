//! Panic recovery middleware
//!
//! Catches panics raised anywhere downstream in the chain, logs the panic
//! message with a backtrace, and answers `500 {"message": "Internal Server Error"}`.
//! Whatever the chain had written before the panic is discarded, so nothing
//! about the panic reaches the client.
//!
//! The message and backtrace are taken by a process-wide panic hook while the
//! panicking stack is still intact. For panics inside a recovery boundary the
//! hook records them for this middleware instead of printing to stderr; all
//! other panics go to the previously installed hook.
//!
//! Only panics below this middleware are caught. A group without it lets a
//! panic escape to the transport, which answers a bare 500.

use crate::{Context, StatusCode};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

struct CapturedPanic {
    message: String,
    location: String,
    backtrace: Backtrace,
}

thread_local! {
    /// Recovery boundaries currently running on this thread
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<CapturedPanic>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let captured = CapturedPanic {
                message: panic_message(info.payload()),
                location: info.location().map(ToString::to_string).unwrap_or_default(),
                backtrace: Backtrace::force_capture(),
            };
            CAPTURED.with(|slot| *slot.borrow_mut() = Some(captured));
        }));
    });
}

/// Marks the current thread as inside a recovery boundary until dropped
struct Boundary;

impl Boundary {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        CAPTURED.with(|slot| slot.borrow_mut().take());
        Boundary
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Create the recovery middleware; install it before everything it guards
pub fn recovery() -> impl Fn(&mut Context) + Send + Sync + 'static {
    install_hook();

    |ctx: &mut Context| {
        let result = {
            let _boundary = Boundary::enter();
            panic::catch_unwind(AssertUnwindSafe(|| ctx.next()))
        };
        let Err(payload) = result else {
            return;
        };

        // the hook is missing if someone replaced it after us
        let captured = CAPTURED
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| CapturedPanic {
                message: panic_message(payload.as_ref()),
                location: String::new(),
                backtrace: Backtrace::force_capture(),
            });

        tracing::error!(
            method = %ctx.method,
            path = %ctx.path,
            location = %captured.location,
            backtrace = %captured.backtrace,
            "panic recovered: {}",
            captured.message
        );
        ctx.reset_response();
        ctx.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
}

/// Text of a panic payload (`panic!` with a literal or a formatted message)
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
