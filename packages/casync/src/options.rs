use std::rc::Rc;

use crate::{Scheduler, TokioLocal};

/// Options for [`wrap`](crate::wrap)
///
/// ```rust
/// # use casync::{Options, TickQueue};
/// let options = Options::default().strict(false).scheduler(TickQueue::new());
/// assert!(!options.is_strict());
/// ```
#[derive(Clone)]
pub struct Options {
    strict: bool,
    scheduler: Rc<dyn Scheduler>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strict: true,
            scheduler: Rc::new(TokioLocal),
        }
    }
}

impl Options {
    /// Default options, but with strict mode turned off
    pub fn non_strict() -> Self {
        Self::default().strict(false)
    }

    /// Set strict mode (on by default).
    ///
    /// In strict mode, a coroutine that returns without calling its completion
    /// callback is completed automatically with its return value, and a
    /// continuation called twice for the same suspension is rejected.
    ///
    /// With strict mode off, a coroutine that returns without completing
    /// never notifies the caller. This is for coroutines that keep the
    /// completion callback around and call it from somewhere else.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set where re-entrant resumptions are deferred to
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Rc::new(scheduler);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub(crate) fn defer(&self, task: crate::Task) -> Result<(), crate::DriverError> {
        self.scheduler.defer(task)
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// The serializable part of [`Options`]
///
/// Missing fields take their default values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptionsConfig {
    pub strict: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl From<OptionsConfig> for Options {
    fn from(value: OptionsConfig) -> Self {
        Self::default().strict(value.strict)
    }
}
