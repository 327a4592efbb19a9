//! `sapitos-notifications` — the notification emitter boundary.
//!
//! Notifications are advisory and strictly best-effort: a failed emission is
//! logged and swallowed, and must never affect the mutation that triggered
//! it. Emitters therefore run *after* the triggering transaction commits.

pub mod emitter;

pub use emitter::{
    notify_low_stock, EmitError, InMemoryEmitter, Notification, NotificationEmitter, Severity,
    TracingEmitter,
};
