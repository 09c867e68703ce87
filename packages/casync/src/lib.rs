//! Callback-driven coroutines
//!
//! `casync` turns a cooperative coroutine into a function that reports its
//! outcome through an error-first completion callback. This lets code that lives
//! on a callback-based runtime be written in a straight-line, `await`-like style.
//!
//! # Coroutines
//! A coroutine body is an `async` block that receives a [`Context`]. The
//! only suspension point is [`Context::suspend`]: the body hands its
//! continuation ([`Context::next`]) to some operation, then suspends until the
//! operation calls it back.
//!
//! ```rust
//! # use casync::{Arg, Callback, Context, Coroutine, Options, TickQueue};
//! let queue = TickQueue::new();
//! let double = casync::wrap(
//!     Coroutine::new(1, |cx: Context<(), i64>| async move {
//!         let value = cx.arg(0).copied().unwrap_or_default();
//!         // an operation that happens to complete synchronously
//!         cx.next()?.ok(value * 2)?;
//!         let doubled = cx.suspend().await?.into_single()?;
//!         casync::Ok(doubled)
//!     }),
//!     Options::default().scheduler(queue.clone()),
//! );
//! double.call(vec![
//!     Arg::Value(21),
//!     Arg::Callback(Callback::new(|err, value| {
//!         assert!(err.is_none());
//!         assert_eq!(value, Some(42));
//!     })),
//! ]).unwrap();
//! queue.run_until_idle();
//! ```
//!
//! # Completion
//! The completion callback fires exactly once per invocation:
//! - when the body calls [`Done::complete`] (through [`Context::done`]), or
//! - when the body returns, in strict mode (the default), or
//! - when an error escapes the body, or the body panics.
//!
//! Completing twice is a [`DriverError::DoubleCompletion`], and calling a
//! continuation after completion is a [`DriverError::PostCompletion`].
//! These are misuse of the driver and are returned to whoever triggered them,
//! instead of being delivered through the completion callback.
//!
//! # Reentrancy
//! When a continuation is called while its coroutine is still running (the
//! operation finished synchronously), the resumption is deferred to the next
//! turn of the [`Scheduler`] configured in [`Options`]. The default,
//! [`TokioLocal`], needs a `tokio::task::LocalSet`. [`TickQueue`] is a
//! manually drained run queue for runtimes that do not use tokio.
//!
//! # Declaring coroutines
//! The [`coroutine`] attribute turns an `async fn` into a [`Coroutine`]
//! definition, taking the parameter count from the signature.
//!
//! # `log` integration
//! The driver logs through the [`log`](https://docs.rs/log) facade.
//! [`log_init`] installs a simple stderr logger honoring `RUST_LOG`, for tests
//! and small binaries.

mod callback;
pub use callback::{Arg, Callback};
mod driver;
pub use driver::{Context, Next, Suspend};
mod error;
pub use error::DriverError;
mod guard;
pub use guard::Done;
mod logging;
pub use logging::{init_log, log_init};
mod misc;
mod options;
pub use options::{Options, OptionsConfig};
mod resumed;
pub use resumed::Resumed;
mod sched;
pub use sched::{Scheduler, Task, TickQueue, TokioLocal};
mod wrap;
pub use wrap::{Coroutine, RESERVED_SLOTS, Wrapped, wrap};

pub use casync_proc_macros::coroutine;

// re-exports from libraries
pub use anyhow::{Error, Ok, Result, anyhow as fmterr, bail, ensure};
pub use log::{debug, error, info, trace, warn};

#[doc(hidden)]
pub mod __priv {
    pub use crate::driver::{Invocation, take_args};
}

/// Prelude imports
pub mod pre {
    pub use anyhow::Context as _;
}
