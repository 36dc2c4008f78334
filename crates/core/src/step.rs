//! Steps and ready-made step combinators
//!
//! A step receives the shared context and the handle of the task running it.
//! It may mutate the context, drive the task (`skip`, `complete`, `fail`,
//! `render`, spinner control) and optionally return a [`Ui`] to display.
//! Returning an error fails the task; see [`crate::error::TaskError`].

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::task::TaskHandle;
use crate::ui::Ui;

pub type StepResult<C> = anyhow::Result<Option<Ui<C>>>;
pub type StepFuture<'a, C> = Pin<Box<dyn Future<Output = StepResult<C>> + Send + 'a>>;

#[async_trait]
pub trait Step<C>: Send + Sync {
    async fn run(&self, ctx: &mut C, task: &mut TaskHandle) -> StepResult<C>;
}

/// Step backed by a synchronous closure
pub struct FnStep<F>(F);

pub fn from_fn<C, F>(f: F) -> FnStep<F>
where
    F: Fn(&mut C, &mut TaskHandle) -> StepResult<C> + Send + Sync,
{
    FnStep(f)
}

#[async_trait]
impl<C, F> Step<C> for FnStep<F>
where
    C: Send,
    F: Fn(&mut C, &mut TaskHandle) -> StepResult<C> + Send + Sync,
{
    async fn run(&self, ctx: &mut C, task: &mut TaskHandle) -> StepResult<C> {
        (self.0)(ctx, task)
    }
}

/// Step backed by a closure returning a boxed future
///
/// ```rust,ignore
/// let step = from_async(|ctx: &mut Ctx, _task: &mut TaskHandle| {
///     Box::pin(async move {
///         ctx.file = client.fetch_file(&ctx.file_key).await?;
///         Ok(None)
///     })
/// });
/// ```
pub struct AsyncFnStep<F>(F);

pub fn from_async<C, F>(f: F) -> AsyncFnStep<F>
where
    F: for<'a> Fn(&'a mut C, &'a mut TaskHandle) -> StepFuture<'a, C> + Send + Sync,
{
    AsyncFnStep(f)
}

#[async_trait]
impl<C, F> Step<C> for AsyncFnStep<F>
where
    C: Send,
    F: for<'a> Fn(&'a mut C, &'a mut TaskHandle) -> StepFuture<'a, C> + Send + Sync,
{
    async fn run(&self, ctx: &mut C, task: &mut TaskHandle) -> StepResult<C> {
        (self.0)(ctx, task).await
    }
}

/// Step that only displays a fixed description
pub struct TransitionTo<C>(Ui<C>);

pub fn transition_to<C>(ui: impl Into<Ui<C>>) -> TransitionTo<C> {
    TransitionTo(ui.into())
}

#[async_trait]
impl<C: Send> Step<C> for TransitionTo<C> {
    async fn run(&self, _ctx: &mut C, _task: &mut TaskHandle) -> StepResult<C> {
        Ok(Some(self.0.clone()))
    }
}

/// Runs the wrapped step with the spinner paused.
///
/// The spinner resumes afterwards only when the step succeeded and left the
/// task pending; a failed or finished task persists its own final line.
pub struct PauseSpinning<S>(S);

pub fn pause_spinning_and_run<S>(step: S) -> PauseSpinning<S> {
    PauseSpinning(step)
}

#[async_trait]
impl<C, S> Step<C> for PauseSpinning<S>
where
    C: Send,
    S: Step<C>,
{
    async fn run(&self, ctx: &mut C, task: &mut TaskHandle) -> StepResult<C> {
        task.stop_spinner::<C>(ctx, None);
        let result = self.0.run(ctx, task).await;
        if result.is_ok() && task.is_pending() {
            task.start_spinner::<C>(ctx, None);
        }
        result
    }
}

/// Awaits a bare future-producing function with the spinner paused
pub struct PauseSpinningAwait<F>(F);

pub fn pause_spinning_and_await<F, Fut>(f: F) -> PauseSpinningAwait<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    PauseSpinningAwait(f)
}

#[async_trait]
impl<C, F, Fut> Step<C> for PauseSpinningAwait<F>
where
    C: Send,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn run(&self, ctx: &mut C, task: &mut TaskHandle) -> StepResult<C> {
        task.stop_spinner::<C>(ctx, None);
        (self.0)().await?;
        if task.is_pending() {
            task.start_spinner::<C>(ctx, None);
        }
        Ok(None)
    }
}
