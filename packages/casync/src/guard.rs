use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{Callback, DriverError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    Explicit,
    Automatic,
}

/// Guarded completion callback of one invocation.
///
/// The underlying [`Callback`] is called at most once. Every later attempt
/// fails with [`DriverError::DoubleCompletion`], which records whether the
/// first completion was automatic (the coroutine returned) or explicit.
///
/// This can be cloned and moved out of the coroutine body, for example
/// to complete from a callback the body registered somewhere else.
pub struct Done<V>(Rc<DoneInner<V>>);
struct DoneInner<V> {
    state: Cell<State>,
    callback: RefCell<Option<Callback<V>>>,
}

impl<V> Clone for Done<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: 'static> Done<V> {
    pub(crate) fn new(callback: Callback<V>) -> Self {
        Self(Rc::new(DoneInner {
            state: Cell::new(State::Pending),
            callback: RefCell::new(Some(callback)),
        }))
    }

    /// Complete the invocation explicitly with an error-first pair
    pub fn complete(&self, error: Option<crate::Error>, value: Option<V>) -> Result<(), DriverError> {
        self.finish(error, value, State::Explicit)
    }

    /// Complete successfully with a value (or `None`)
    pub fn ok(&self, value: impl Into<Option<V>>) -> Result<(), DriverError> {
        self.complete(None, value.into())
    }

    /// Complete with an error
    pub fn fail(&self, error: impl Into<crate::Error>) -> Result<(), DriverError> {
        self.complete(Some(error.into()), None)
    }

    /// Check if the invocation has completed, either way
    pub fn is_completed(&self) -> bool {
        self.0.state.get() != State::Pending
    }

    /// Check if the invocation was completed by the coroutine returning
    pub fn is_automatic(&self) -> bool {
        self.0.state.get() == State::Automatic
    }

    /// Convert into a callback, so it can be handed to another wrapped coroutine
    /// to complete this invocation with that one's outcome
    pub fn into_callback(self) -> Callback<V> {
        Callback::fallible(move |error, value| self.complete(error, value))
    }

    pub(crate) fn complete_automatic(&self, value: Option<V>) -> Result<(), DriverError> {
        self.finish(None, value, State::Automatic)
    }

    fn finish(&self, error: Option<crate::Error>, value: Option<V>, next: State) -> Result<(), DriverError> {
        match self.0.state.get() {
            State::Pending => {}
            prev => {
                log::trace!("rejecting second completion, first was {prev:?}");
                return Err(DriverError::DoubleCompletion {
                    automatic: prev == State::Automatic,
                    source: error,
                });
            }
        }
        self.0.state.set(next);
        // released before calling, the callback can re-enter
        let callback = self.0.callback.borrow_mut().take();
        match callback {
            Some(callback) => callback.invoke(error, value),
            None => Ok(()),
        }
    }
}
