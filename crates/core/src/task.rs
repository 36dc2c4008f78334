//! Tasks: ordered steps over one shared context
//!
//! A [`Task`] runs its steps strictly in declared order, one at a time, over
//! a single `&mut C`. Nothing here synchronises access to the context; that
//! is sound only because steps never run concurrently. Keep it that way:
//! parallel steps would need explicit coordination around the context.
//!
//! State moves once from [`TaskState::Pending`] to one of the terminal
//! states. Later `skip`/`complete`/`fail` calls may still update the
//! displayed line but never change the state again within a run.

use std::fmt;

use tracing::{debug, trace};

use crate::display::{SpinnerOptions, StatusDisplay, Symbol, TerminalSpinner};
use crate::error::unwrap_failure;
use crate::step::Step;
use crate::ui::{self, Rendered, Ui};

/// Line shown while a task without an initial description is running
pub const RUNNING_PLACEHOLDER: &str = "Running";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Completed,
    Failed,
    Skipped,
}

impl TaskState {
    fn symbol(self) -> Symbol {
        match self {
            TaskState::Completed => Symbol::Success,
            TaskState::Failed => Symbol::Failure,
            TaskState::Skipped | TaskState::Pending => Symbol::Info,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Pending => "pending",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Outcome of a task's skip predicate
pub enum SkipDecision<C> {
    Run,
    /// Skip, keeping the current line
    Skip,
    /// Skip and show this description
    SkipWith(Ui<C>),
}

impl<C> From<bool> for SkipDecision<C> {
    fn from(skip: bool) -> Self {
        if skip {
            SkipDecision::Skip
        } else {
            SkipDecision::Run
        }
    }
}

pub type SkipPredicate<C> = Box<dyn Fn(&C) -> SkipDecision<C> + Send + Sync>;

/// Receives the effective error of a failed task.
///
/// Returning `Ok` swallows the failure so an enclosing workflow carries on;
/// returning the error aborts it.
pub type ErrorHandler<C> =
    Box<dyn Fn(anyhow::Error, &C, &TaskHandle) -> anyhow::Result<()> + Send + Sync>;

/// The part of a task that steps can drive
pub struct TaskHandle {
    name: String,
    state: TaskState,
    rendered: Rendered,
    display: Box<dyn StatusDisplay>,
}

impl TaskHandle {
    fn new(name: String, display: Box<dyn StatusDisplay>) -> Self {
        Self {
            name,
            state: TaskState::Pending,
            rendered: Rendered::default(),
            display,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == TaskState::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.state == TaskState::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.state == TaskState::Skipped
    }

    pub fn is_spinning(&self) -> bool {
        self.display.is_spinning()
    }

    /// Text currently on display, without the subtext
    pub fn current_text(&self) -> Option<&str> {
        self.rendered.text.as_deref()
    }

    pub fn rendered(&self) -> &Rendered {
        &self.rendered
    }

    /// Update the displayed line without touching the state
    pub fn render<C>(&mut self, ctx: &C, ui: Ui<C>) {
        self.apply(ctx, &ui);
        self.display.update(&self.rendered.to_string());
    }

    pub fn skip<C>(&mut self, ctx: &C, ui: Option<Ui<C>>) {
        self.finish(ctx, TaskState::Skipped, ui);
    }

    pub fn complete<C>(&mut self, ctx: &C, ui: Option<Ui<C>>) {
        self.finish(ctx, TaskState::Completed, ui);
    }

    pub fn fail<C>(&mut self, ctx: &C, ui: Option<Ui<C>>) {
        self.finish(ctx, TaskState::Failed, ui);
    }

    /// Resume the live indicator. No-op when it is already running.
    pub fn start_spinner<C>(&mut self, ctx: &C, ui: Option<Ui<C>>) {
        if let Some(ui) = ui {
            self.apply(ctx, &ui);
        }
        let line = self.rendered.to_string();
        if self.display.is_spinning() {
            self.display.update(&line);
        } else {
            self.display.start(&line);
        }
    }

    /// Pause the live indicator so other output can use the terminal.
    ///
    /// With a description the line is left on screen as information;
    /// without one it is cleared. No-op when already paused.
    pub fn stop_spinner<C>(&mut self, ctx: &C, ui: Option<Ui<C>>) {
        if !self.display.is_spinning() {
            return;
        }
        match ui {
            Some(ui) => {
                self.apply(ctx, &ui);
                self.display.persist(Symbol::Info, &self.rendered.to_string());
            }
            None => self.display.stop(),
        }
    }

    fn apply<C>(&mut self, ctx: &C, ui: &Ui<C>) {
        self.rendered.merge(ui::render(ctx, Some(ui)));
    }

    fn finish<C>(&mut self, ctx: &C, target: TaskState, ui: Option<Ui<C>>) {
        if let Some(ui) = ui {
            self.apply(ctx, &ui);
        }
        if self.state == TaskState::Pending {
            self.state = target;
            debug!(task = %self.name, state = %target, "task finished");
        } else {
            trace!(task = %self.name, state = %self.state, requested = %target, "task already finished");
        }
        self.display
            .persist(self.state.symbol(), &self.rendered.to_string());
    }

    fn begin(&mut self, initial: Rendered) {
        self.state = TaskState::Pending;
        self.rendered = initial;
        self.display.start(&self.rendered.to_string());
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("rendered", &self.rendered)
            .finish()
    }
}

/// A named, ordered sequence of steps sharing one context
pub struct Task<C> {
    steps: Vec<Box<dyn Step<C>>>,
    initial: Option<Ui<C>>,
    skip: Option<SkipPredicate<C>>,
    error_handler: Option<ErrorHandler<C>>,
    handle: TaskHandle,
}

impl<C: Send + 'static> Task<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            initial: None,
            skip: None,
            error_handler: None,
            handle: TaskHandle::new(name.into(), Box::new(TerminalSpinner::default())),
        }
    }

    pub fn step(mut self, step: impl Step<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Box<dyn Step<C>>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Line shown when the task starts
    pub fn initial(mut self, ui: impl Into<Ui<C>>) -> Self {
        self.initial = Some(ui.into());
        self
    }

    /// Predicate evaluated once before any step runs
    pub fn skip_when<D>(mut self, predicate: impl Fn(&C) -> D + Send + Sync + 'static) -> Self
    where
        D: Into<SkipDecision<C>>,
    {
        self.skip = Some(Box::new(move |ctx: &C| -> SkipDecision<C> { predicate(ctx).into() }));
        self
    }

    pub fn on_error(
        mut self,
        handler: impl Fn(anyhow::Error, &C, &TaskHandle) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    pub fn spinner_options(self, options: SpinnerOptions) -> Self {
        self.display(TerminalSpinner::new(options))
    }

    pub fn display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.handle.display = Box::new(display);
        self
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn state(&self) -> TaskState {
        self.handle.state()
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_pending()
    }

    pub fn is_completed(&self) -> bool {
        self.handle.is_completed()
    }

    pub fn is_failed(&self) -> bool {
        self.handle.is_failed()
    }

    pub fn is_skipped(&self) -> bool {
        self.handle.is_skipped()
    }

    pub fn current_text(&self) -> Option<&str> {
        self.handle.current_text()
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Run the task over `ctx`.
    ///
    /// Errors are those re-raised by the error handler; the default handler
    /// re-raises every failure.
    pub async fn run(&mut self, ctx: &mut C) -> anyhow::Result<()> {
        let initial = match &self.initial {
            Some(ui) => ui.render(ctx),
            None => Rendered::text(RUNNING_PLACEHOLDER),
        };
        debug!(task = %self.handle.name, steps = self.steps.len(), "starting task");
        self.handle.begin(initial);

        if let Some(predicate) = &self.skip {
            match predicate(&*ctx) {
                SkipDecision::Run => {}
                SkipDecision::Skip => {
                    self.handle.skip::<C>(ctx, None);
                    return Ok(());
                }
                SkipDecision::SkipWith(ui) => {
                    self.handle.skip(ctx, Some(ui));
                    return Ok(());
                }
            }
        }

        match run_steps(&self.steps, &mut self.handle, ctx).await {
            Ok(()) => {
                if self.handle.is_pending() {
                    self.handle.complete::<C>(ctx, None);
                }
                Ok(())
            }
            Err(error) => {
                let (ui, effective) = unwrap_failure::<C>(error);
                self.handle.fail(ctx, ui);
                debug!(task = %self.handle.name, error = %effective, "task failed");
                match &self.error_handler {
                    Some(handler) => handler(effective, &*ctx, &self.handle),
                    None => Err(effective),
                }
            }
        }
    }

    /// Run over a fresh default context and hand it back
    pub async fn run_with_default(&mut self) -> anyhow::Result<C>
    where
        C: Default,
    {
        let mut ctx = C::default();
        self.run(&mut ctx).await?;
        Ok(ctx)
    }
}

async fn run_steps<C: Send>(
    steps: &[Box<dyn Step<C>>],
    handle: &mut TaskHandle,
    ctx: &mut C,
) -> anyhow::Result<()> {
    for (index, step) in steps.iter().enumerate() {
        if !handle.is_pending() {
            trace!(task = %handle.name, step = index, state = %handle.state, "short-circuiting remaining steps");
            break;
        }
        trace!(task = %handle.name, step = index, "running step");
        if let Some(ui) = step.run(ctx, handle).await? {
            handle.render(ctx, ui);
        }
    }
    Ok(())
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("handle", &self.handle)
            .field("steps", &self.steps.len())
            .field("has_skip", &self.skip.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .finish()
    }
}
