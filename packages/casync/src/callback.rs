use crate::DriverError;

type RawCallback<V> = Box<dyn FnOnce(Option<crate::Error>, Option<V>) -> Result<(), DriverError>>;

/// An error-first completion callback.
///
/// Called with `(Some(error), None)` on failure, or `(None, value)` when
/// the coroutine completes successfully.
pub struct Callback<V>(RawCallback<V>);

impl<V: 'static> Callback<V> {
    /// Create a callback from a closure
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Option<crate::Error>, Option<V>) + 'static,
    {
        Self(Box::new(move |error, value| {
            f(error, value);
            Ok(())
        }))
    }

    /// Create a callback whose failure is reported back to whoever completed it.
    ///
    /// This is how a continuation is used as a completion callback
    /// (see [`Next::into_callback`](crate::Next::into_callback)): if
    /// resuming fails, the error is returned from the completion call.
    pub fn fallible<F>(f: F) -> Self
    where
        F: FnOnce(Option<crate::Error>, Option<V>) -> Result<(), DriverError> + 'static,
    {
        Self(Box::new(f))
    }

    /// A callback that does nothing, used when the caller does not pass one
    pub fn noop() -> Self {
        Self(Box::new(|_, _| Ok(())))
    }
}

impl<V> Callback<V> {
    pub(crate) fn invoke(self, error: Option<crate::Error>, value: Option<V>) -> Result<(), DriverError> {
        (self.0)(error, value)
    }
}

impl<V> std::fmt::Debug for Callback<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Callback")
    }
}

/// One argument passed to a [`Wrapped`](crate::Wrapped) function.
///
/// Data parameters take [`Arg::Value`]. The optional last argument is the
/// completion callback, [`Arg::Callback`].
#[derive(Debug)]
pub enum Arg<V> {
    Value(V),
    Callback(Callback<V>),
}

impl<V> From<Callback<V>> for Arg<V> {
    fn from(value: Callback<V>) -> Self {
        Self::Callback(value)
    }
}
