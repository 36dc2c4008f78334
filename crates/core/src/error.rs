//! User-facing step failures
//!
//! A step that wants to fail with a specific message returns a [`TaskError`]
//! instead of a bare error. The task shows the carried [`Ui`] in its failure
//! line and hands the underlying cause, not the wrapper, to its error handler.

use std::error::Error as StdError;
use std::fmt;

use crate::ui::Ui;

const TASK_ERROR_MESSAGE: &str = "task failed";

pub struct TaskError<C> {
    ui: Ui<C>,
    cause: Option<anyhow::Error>,
}

impl<C> TaskError<C> {
    pub fn new(ui: impl Into<Ui<C>>) -> Self {
        Self {
            ui: ui.into(),
            cause: None,
        }
    }

    pub fn with_cause(ui: impl Into<Ui<C>>, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            ui: ui.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn ui(&self) -> &Ui<C> {
        &self.ui
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    pub(crate) fn take_cause(&mut self) -> Option<anyhow::Error> {
        self.cause.take()
    }
}

impl<C> fmt::Debug for TaskError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskError")
            .field("ui", &self.ui)
            .field("cause", &self.cause)
            .finish()
    }
}

impl<C> fmt::Display for TaskError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(TASK_ERROR_MESSAGE)
    }
}

impl<C> StdError for TaskError<C> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Whether an error raised by a step is a [`TaskError`] for context `C`
pub fn is_task_error<C: 'static>(error: &anyhow::Error) -> bool {
    error.is::<TaskError<C>>()
}

/// Resolve the error a failed task surfaces.
///
/// A [`TaskError`] gives up its cause when it has one and otherwise surfaces
/// itself; any other error surfaces unchanged. The returned [`Ui`] is what
/// the task displays as its failure line.
pub(crate) fn unwrap_failure<C: 'static>(error: anyhow::Error) -> (Option<Ui<C>>, anyhow::Error) {
    match error.downcast::<TaskError<C>>() {
        Ok(mut task_error) => {
            let ui = task_error.ui.clone();
            let effective = match task_error.take_cause() {
                Some(cause) => cause,
                None => anyhow::Error::new(task_error),
            };
            (Some(ui), effective)
        }
        Err(other) => (None, other),
    }
}
