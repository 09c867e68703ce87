/// Misuse of the coroutine driver.
///
/// These are programmer errors, and are returned to whoever triggered
/// them, instead of going through the completion callback. Errors raised by
/// a coroutine body are plain [`crate::Error`]s, delivered to the completion
/// callback.
#[derive(Debug, derive_more::Display)]
pub enum DriverError {
    /// The wrapped function was called with the wrong number of arguments.
    #[display(
        "wrong number of arguments: expected {expected} (plus an optional completion callback), got {got}"
    )]
    Arity { expected: usize, got: usize },

    /// A callback slot holds a value, or a value slot holds a callback,
    /// or a continuation was called twice for one suspension.
    #[display("{_0}")]
    Contract(String),

    /// The completion callback was invoked a second time.
    ///
    /// `automatic` is true if the first completion was triggered by the
    /// coroutine returning, rather than an explicit call. `source` is
    /// the error carried by the second attempt, if any.
    #[display(
        "completion callback called more than once (it was already called {})",
        if *automatic { "automatically when the coroutine returned" } else { "explicitly" }
    )]
    DoubleCompletion {
        automatic: bool,
        source: Option<crate::Error>,
    },

    /// A continuation was called after the invocation completed.
    #[display("continuation called after the coroutine completed")]
    PostCompletion,

    /// A continuation was called after the coroutine returned without
    /// completing (non-strict mode).
    #[display("continuation called after the coroutine returned without completing")]
    Terminated,
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DoubleCompletion {
                source: Some(e), ..
            } => Some(&**e),
            _ => None,
        }
    }
}

impl DriverError {
    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }
}
