use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::DriverError;

/// A deferred resumption
pub type Task = Box<dyn FnOnce() + 'static>;

/// Where re-entrant resumptions are deferred to.
///
/// When a continuation is called while its coroutine is still being
/// resumed, the driver hands the resumption to [`defer`](Scheduler::defer).
/// The task must run on a later turn, after the current resumption has
/// returned, and deferred tasks must run in the order they were deferred.
///
/// An error is returned to whoever called the continuation, and the task
/// is dropped without running.
pub trait Scheduler {
    fn defer(&self, task: Task) -> Result<(), DriverError>;
}

/// Defer onto the current `tokio::task::LocalSet`.
///
/// This is the default scheduler. Calling a continuation re-entrantly outside
/// of a `LocalSet` is a [`DriverError::Contract`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLocal;

impl Scheduler for TokioLocal {
    fn defer(&self, task: Task) -> Result<(), DriverError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(DriverError::contract(
                "cannot defer resumption: not inside a tokio runtime (TokioLocal needs a LocalSet)",
            ));
        }
        // spawn_local panics when there is no LocalSet
        let spawned = panic::catch_unwind(AssertUnwindSafe(move || {
            // detached, the task reports its own failure
            drop(tokio::task::spawn_local(async move { task() }));
        }));
        spawned.map_err(|_| {
            DriverError::contract("cannot defer resumption: TokioLocal needs a tokio LocalSet")
        })
    }
}

/// A run queue that is drained manually.
///
/// Use this to embed the driver in an event loop that is not tokio: call
/// [`run_until_idle`](Self::run_until_idle) once per turn of the loop.
/// Clones share the same queue.
#[derive(Default, Clone)]
pub struct TickQueue(Rc<RefCell<VecDeque<Task>>>);

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Run the oldest task. Return `false` if the queue was empty.
    pub fn run_once(&self) -> bool {
        // the task may defer more work onto this queue
        let task = self.0.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks deferred
    /// while running. Return the number of tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut count = 0;
        while self.run_once() {
            count += 1;
        }
        log::trace!("tick queue idle after {count} task(s)");
        count
    }
}

impl Scheduler for TickQueue {
    fn defer(&self, task: Task) -> Result<(), DriverError> {
        self.0.borrow_mut().push_back(task);
        Ok(())
    }
}

impl std::fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickQueue").field("len", &self.len()).finish()
    }
}
