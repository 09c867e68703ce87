use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{self, Poll, Waker};

use crate::{Callback, Done, DriverError, Options, Resumed};

/// A running coroutine body
pub(crate) type Instance<V> = Pin<Box<dyn Future<Output = crate::Result<Option<V>>>>>;
/// A coroutine definition, instantiated once per invocation
pub(crate) type Body<S, V> = Rc<dyn Fn(Context<S, V>) -> Instance<V>>;

type Outcome<V> = crate::Result<Resumed<V>>;

/// The slot a resumption is passed through, from the driver to the
/// [`Suspend`] future the body is parked on
struct Shared<V> {
    slot: RefCell<Option<Outcome<V>>>,
    /// if the last poll stopped at a `Suspend`
    parked: Cell<bool>,
}

/// Drives one invocation of a coroutine
struct Driver<V> {
    /// `None` before the first step, and after the body returned
    instance: RefCell<Option<Instance<V>>>,
    shared: Rc<Shared<V>>,
    done: Done<V>,
    options: Options,
    /// set while the instance is being polled
    running: Cell<bool>,
    terminated: Cell<bool>,
    /// resumptions handed to the scheduler that have not run yet
    deferred: Cell<usize>,
}

/// Start one invocation: create the instance and run it to its first suspension
pub(crate) fn start<S: 'static, V: 'static>(
    body: &Body<S, V>,
    this: S,
    args: Vec<V>,
    callback: Callback<V>,
    options: Options,
) -> Result<(), DriverError> {
    let done = Done::new(callback);
    let shared = Rc::new(Shared {
        slot: RefCell::new(None),
        parked: Cell::new(false),
    });
    let driver = Rc::new(Driver {
        instance: RefCell::new(None),
        shared: Rc::clone(&shared),
        done: done.clone(),
        options,
        running: Cell::new(false),
        terminated: Cell::new(false),
        deferred: Cell::new(0),
    });
    // the body only gets a weak reference to its own driver, so an
    // instance nobody will resume again is dropped with its last continuation
    let cx = Context {
        this,
        args,
        done,
        shared,
        driver: Rc::downgrade(&driver),
    };
    let instance = body(cx);
    *driver.instance.borrow_mut() = Some(instance);
    driver.step()
}

impl<V: 'static> Driver<V> {
    fn check_resumable(&self) -> Result<(), DriverError> {
        if self.done.is_completed() {
            return Err(DriverError::PostCompletion);
        }
        if self.terminated.get() {
            return Err(DriverError::Terminated);
        }
        Ok(())
    }

    /// Resume now, or on the next turn if the instance is currently being polled
    fn resume_or_defer(self: &Rc<Self>, outcome: Outcome<V>) -> Result<(), DriverError> {
        self.check_resumable()?;
        let deferred = self.deferred.get();
        if !self.running.get() && deferred == 0 {
            return self.resume(outcome);
        }
        if deferred > 0 && self.options.is_strict() {
            return Err(DriverError::contract(
                "continuation called more than once before the coroutine suspended again",
            ));
        }
        log::debug!("continuation called while the coroutine is running, deferring to the next turn");
        self.deferred.set(deferred + 1);
        let driver = Rc::clone(self);
        let deferred_result = self.options.defer(Box::new(move || {
            driver.deferred.set(driver.deferred.get().saturating_sub(1));
            if let Err(e) = driver.resume(outcome) {
                log::error!("deferred resumption failed: {e}");
            }
        }));
        if let Err(e) = deferred_result {
            self.deferred.set(deferred);
            return Err(e);
        }
        Ok(())
    }

    fn resume(&self, outcome: Outcome<V>) -> Result<(), DriverError> {
        self.check_resumable()?;
        if self.running.get() {
            return Err(DriverError::contract("coroutine resumed while it is already running"));
        }
        *self.shared.slot.borrow_mut() = Some(outcome);
        self.step()
    }

    /// Poll the instance once, and settle the outcome if it finished
    fn step(&self) -> Result<(), DriverError> {
        let poll = {
            let Ok(mut instance) = self.instance.try_borrow_mut() else {
                return Err(DriverError::contract("coroutine resumed while it is already running"));
            };
            let Some(future) = instance.as_mut() else {
                return Err(DriverError::Terminated);
            };
            log::trace!("resuming coroutine");
            self.shared.parked.set(false);
            self.running.set(true);
            let mut cx = task::Context::from_waker(Waker::noop());
            let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));
            self.running.set(false);
            poll
        };

        let result = match poll {
            Ok(Poll::Pending) => {
                if !self.shared.parked.get() {
                    log::warn!(
                        "coroutine suspended on something other than its continuation, it will only resume when the continuation is called"
                    );
                }
                if self.done.is_completed() {
                    log::trace!("coroutine completed explicitly and suspended, dropping it");
                    self.finish();
                }
                return Ok(());
            }
            Ok(Poll::Ready(result)) => result,
            Err(payload) if self.done.is_completed() => {
                // nowhere left to deliver it, this includes a panic
                // raised by the completion callback itself
                self.finish();
                panic::resume_unwind(payload);
            }
            Err(payload) => Err(crate::fmterr!(
                "coroutine panicked: {}",
                crate::misc::panic_message(&*payload)
            )),
        };
        self.finish();

        match result {
            Ok(value) => {
                if self.done.is_completed() {
                    log::trace!("coroutine returned after completing");
                    Ok(())
                } else if self.options.is_strict() {
                    self.done.complete_automatic(value)
                } else {
                    log::debug!("coroutine returned without completing, the caller will not be notified");
                    Ok(())
                }
            }
            Err(error) => self.done.complete(Some(error), None),
        }
    }

    fn finish(&self) {
        self.terminated.set(true);
        let instance = self.instance.borrow_mut().take();
        drop(instance);
    }
}

/// The continuation of a coroutine.
///
/// Calling it resumes the coroutine from [`Context::suspend`], with either
/// values or an error. Hand it (or [`into_callback`](Self::into_callback))
/// to the operation the coroutine is waiting on. If it is called while
/// the coroutine is still running, the resumption happens on the next
/// turn of the scheduler.
///
/// Calling it after the invocation completed is a
/// [`DriverError::PostCompletion`].
///
/// A `Next` keeps its coroutine alive. An invocation that is never resumed
/// is dropped together with the last `Next`, unless the body itself holds
/// one across [`Context::suspend`]: get the continuation right before
/// handing it off, instead of keeping it in a local.
pub struct Next<V>(Rc<Driver<V>>);

impl<V> Clone for Next<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: 'static> Next<V> {
    /// Error-first resumption: an error is injected at the suspension point,
    /// otherwise the coroutine resumes with the values.
    pub fn call(&self, error: Option<crate::Error>, values: Vec<V>) -> Result<(), DriverError> {
        let outcome = match error {
            Some(error) => Err(error),
            None => Ok(Resumed::from(values)),
        };
        self.0.resume_or_defer(outcome)
    }

    /// Resume with one value
    pub fn ok(&self, value: V) -> Result<(), DriverError> {
        self.0.resume_or_defer(Ok(Resumed::Single(value)))
    }

    /// Resume with any number of values
    pub fn ok_many(&self, values: Vec<V>) -> Result<(), DriverError> {
        self.call(None, values)
    }

    /// Resume with no value
    pub fn unit(&self) -> Result<(), DriverError> {
        self.0.resume_or_defer(Ok(Resumed::Unit))
    }

    /// Resume by injecting an error at the suspension point
    pub fn fail(&self, error: impl Into<crate::Error>) -> Result<(), DriverError> {
        self.0.resume_or_defer(Err(error.into()))
    }

    /// Convert into a completion callback.
    ///
    /// This is how a coroutine waits for another wrapped coroutine: pass
    /// its own continuation as the callee's completion callback, then suspend.
    /// The callee's error is injected at the suspension point, and its value
    /// resumes the coroutine.
    pub fn into_callback(self) -> Callback<V> {
        Callback::fallible(move |error, value| self.call(error, value.into_iter().collect()))
    }
}

/// What a coroutine body receives for one invocation
pub struct Context<S, V> {
    this: S,
    args: Vec<V>,
    done: Done<V>,
    shared: Rc<Shared<V>>,
    driver: Weak<Driver<V>>,
}

impl<S, V: 'static> Context<S, V> {
    /// The receiver the wrapped function was called with
    pub fn this(&self) -> &S {
        &self.this
    }

    /// The data arguments, without the completion callback
    pub fn args(&self) -> &[V] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&V> {
        self.args.get(index)
    }

    /// Take the data arguments out
    pub fn take_args(&mut self) -> Vec<V> {
        std::mem::take(&mut self.args)
    }

    /// Get the continuation of this coroutine.
    ///
    /// This fails if the invocation is already over, which can only happen
    /// when the context was moved out of the body.
    pub fn next(&self) -> Result<Next<V>, DriverError> {
        match self.driver.upgrade() {
            Some(driver) => Ok(Next(driver)),
            None if self.done.is_completed() => Err(DriverError::PostCompletion),
            None => Err(DriverError::Terminated),
        }
    }

    /// Get the completion callback of this invocation, to complete explicitly
    pub fn done(&self) -> Done<V> {
        self.done.clone()
    }

    /// Suspend until the continuation is called.
    ///
    /// Resolves to the values the continuation was called with,
    /// or the error it was called with.
    pub fn suspend(&self) -> Suspend<'_, V> {
        Suspend {
            shared: &self.shared,
        }
    }
}

/// Future returned by [`Context::suspend`]
#[must_use = "the coroutine only suspends when this is awaited"]
pub struct Suspend<'a, V> {
    shared: &'a Shared<V>,
}

impl<V> Future for Suspend<'_, V> {
    type Output = crate::Result<Resumed<V>>;

    fn poll(self: Pin<&mut Self>, _: &mut task::Context<'_>) -> Poll<Self::Output> {
        match self.shared.slot.borrow_mut().take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                self.shared.parked.set(true);
                Poll::Pending
            }
        }
    }
}

/// Access to the type parameters of a [`Context`], for the `coroutine` macro
pub trait Invocation {
    type This;
    type Value;
}

impl<S, V> Invocation for Context<S, V> {
    type This = S;
    type Value = V;
}

/// Move the data arguments out as an array, for the `coroutine` macro
pub fn take_args<S, V: 'static, const N: usize>(cx: &mut Context<S, V>) -> crate::Result<[V; N]> {
    let args = cx.take_args();
    let got = args.len();
    match <[V; N]>::try_from(args) {
        Ok(args) => Ok(args),
        Err(_) => crate::bail!("expected {N} argument(s), got {got}"),
    }
}
