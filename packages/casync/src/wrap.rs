use std::rc::Rc;

use crate::driver::{self, Body, Instance};
use crate::{Arg, Callback, Context, DriverError, Options};

/// Number of trailing parameter slots reserved by the driver: the completion
/// callback and the continuation.
pub const RESERVED_SLOTS: usize = 2;

/// A coroutine definition: a body with a fixed number of data parameters.
///
/// The body is called once per invocation with a [`Context`], and returns
/// the future to drive. Its output is the return value, used to complete the
/// invocation automatically in strict mode. The declared arity is the number of
/// data parameters plus [`RESERVED_SLOTS`].
///
/// Usually declared with the [`coroutine`](crate::coroutine) attribute,
/// which counts the parameters from the signature.
pub struct Coroutine<S, V> {
    params: usize,
    body: Body<S, V>,
}

impl<S, V> Clone for Coroutine<S, V> {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            body: Rc::clone(&self.body),
        }
    }
}

impl<S: 'static, V: 'static> Coroutine<S, V> {
    pub fn new<F, Fut, O>(params: usize, body: F) -> Self
    where
        F: Fn(Context<S, V>) -> Fut + 'static,
        Fut: Future<Output = crate::Result<O>> + 'static,
        O: Into<Option<V>> + 'static,
    {
        let body = move |cx: Context<S, V>| -> Instance<V> {
            let future = body(cx);
            Box::pin(async move { future.await.map(Into::into) })
        };
        Self {
            params,
            body: Rc::new(body),
        }
    }

    /// Number of data parameters
    pub fn params(&self) -> usize {
        self.params
    }

    /// Declared arity, including the reserved slots
    pub fn arity(&self) -> usize {
        self.params + RESERVED_SLOTS
    }
}

/// Wrap a coroutine into a function that reports through a completion callback
pub fn wrap<S: 'static, V: 'static>(coroutine: Coroutine<S, V>, options: Options) -> Wrapped<S, V> {
    Wrapped {
        coroutine,
        options,
    }
}

/// A wrapped coroutine, created with [`wrap`].
///
/// Each call starts a new, independent invocation.
pub struct Wrapped<S, V> {
    coroutine: Coroutine<S, V>,
    options: Options,
}

impl<S, V> Clone for Wrapped<S, V> {
    fn clone(&self) -> Self {
        Self {
            coroutine: self.coroutine.clone(),
            options: self.options.clone(),
        }
    }
}

impl<S: 'static, V: 'static> Wrapped<S, V> {
    /// Call with a receiver, which the body gets from [`Context::this`].
    ///
    /// `args` are the data arguments, optionally followed by the completion
    /// callback. If there is no callback, the outcome is discarded.
    ///
    /// Returns an error without running anything if the arguments do not
    /// fit the declared parameters. Otherwise, the coroutine is started and
    /// runs until it first suspends. Errors raised by the coroutine go to
    /// the completion callback; only misuse of the driver (such as completing
    /// twice) is returned here.
    pub fn call_with(&self, this: S, args: Vec<Arg<V>>) -> Result<(), DriverError> {
        let (args, callback) = bind(self.coroutine.params, args)?;
        log::trace!("starting coroutine with {} argument(s)", args.len());
        driver::start(&self.coroutine.body, this, args, callback, self.options.clone())
    }

    pub fn params(&self) -> usize {
        self.coroutine.params()
    }

    pub fn arity(&self) -> usize {
        self.coroutine.arity()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl<V: 'static> Wrapped<(), V> {
    /// Call without a receiver. See [`call_with`](Self::call_with)
    pub fn call(&self, args: Vec<Arg<V>>) -> Result<(), DriverError> {
        self.call_with((), args)
    }
}

/// Split call-time arguments into data arguments and the completion callback
fn bind<V: 'static>(params: usize, mut args: Vec<Arg<V>>) -> Result<(Vec<V>, Callback<V>), DriverError> {
    let got = args.len();
    let callback = if got == params + 1 {
        match args.pop() {
            Some(Arg::Callback(callback)) => callback,
            _ => {
                return Err(DriverError::contract(format!(
                    "argument {params} must be the completion callback, got a value"
                )));
            }
        }
    } else if got == params {
        Callback::noop()
    } else {
        return Err(DriverError::Arity {
            expected: params,
            got,
        });
    };

    let mut values = Vec::with_capacity(params);
    for (i, arg) in args.into_iter().enumerate() {
        match arg {
            Arg::Value(value) => values.push(value),
            Arg::Callback(_) => {
                return Err(DriverError::contract(format!(
                    "argument {i} must be a value, got a callback"
                )));
            }
        }
    }
    Ok((values, callback))
}
