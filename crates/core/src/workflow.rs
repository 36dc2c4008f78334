//! Sequential task runner
//!
//! A [`Workflow`] owns one context and runs its tasks over it in list order.
//! The first task whose run returns an error stops the workflow; later tasks
//! never start and effects of earlier tasks are left in place.

use tracing::debug;

use crate::task::Task;

pub struct Workflow<C> {
    context: C,
    tasks: Vec<Task<C>>,
    current: Option<usize>,
}

impl<C: Send + 'static> Workflow<C> {
    pub fn new(context: C, tasks: Vec<Task<C>>) -> Self {
        Self {
            context,
            tasks,
            current: None,
        }
    }

    /// Run every task in order, surfacing the first error unchanged
    pub async fn run(&mut self) -> anyhow::Result<()> {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if index > 0 {
                eprintln!();
            }
            self.current = Some(index);
            debug!(task = task.name(), index, "workflow running task");
            task.run(&mut self.context).await?;
        }
        self.current = None;
        Ok(())
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn tasks(&self) -> &[Task<C>] {
        &self.tasks
    }

    /// Index of the task that is running, or that stopped the workflow
    pub fn current(&self) -> Option<usize> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use thiserror::Error;

    use super::*;
    use crate::display::MemoryDisplay;
    use crate::step::from_fn;
    use crate::task::TaskHandle;

    #[derive(Debug, Default)]
    struct Ctx {
        authenticated: bool,
        file_key: Option<String>,
        written: Vec<String>,
    }

    #[derive(Debug, Error, PartialEq)]
    #[error("file not found: {0}")]
    struct NotFound(String);

    fn quiet(name: &str) -> Task<Ctx> {
        Task::new(name).display(MemoryDisplay::new())
    }

    fn login() -> Task<Ctx> {
        quiet("login").step(from_fn(|ctx: &mut Ctx, _task: &mut TaskHandle| {
            ctx.authenticated = true;
            Ok(Some("Signed in".into()))
        }))
    }

    fn write_mapping() -> Task<Ctx> {
        quiet("write").step(from_fn(|ctx: &mut Ctx, _task: &mut TaskHandle| {
            let key = ctx
                .file_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("file key missing"))?;
            ctx.written.push(key);
            Ok(None)
        }))
    }

    #[tokio::test]
    async fn test_tasks_share_context_in_order() {
        let select = quiet("select").step(from_fn(|ctx: &mut Ctx, _task: &mut TaskHandle| {
            assert!(ctx.authenticated);
            ctx.file_key = Some("abc123".to_string());
            Ok(None)
        }));
        let mut workflow = Workflow::new(Ctx::default(), vec![login(), select, write_mapping()]);

        workflow.run().await.unwrap();
        assert!(workflow.tasks().iter().all(|task| task.is_completed()));
        assert_eq!(workflow.current(), None);
        assert_eq!(workflow.into_context().written, vec!["abc123"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_tasks() {
        let failing = quiet("select").step(from_fn(|_ctx: &mut Ctx, _task: &mut TaskHandle| {
            Err(NotFound("abc123".to_string()).into())
        }));
        let mut workflow = Workflow::new(Ctx::default(), vec![login(), failing, write_mapping()]);

        let err = workflow.run().await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<NotFound>(),
            Some(&NotFound("abc123".to_string()))
        );

        let tasks = workflow.tasks();
        assert!(tasks[0].is_completed());
        assert!(tasks[1].is_failed());
        assert!(tasks[2].is_pending());
        assert_eq!(workflow.current(), Some(1));
        assert!(workflow.context().authenticated);
        assert!(workflow.context().written.is_empty());
    }

    #[tokio::test]
    async fn test_swallowing_handler_lets_later_tasks_run() {
        let tolerant = quiet("optional")
            .on_error(|_err, _ctx: &Ctx, _handle| Ok(()))
            .step(from_fn(|_ctx: &mut Ctx, _task: &mut TaskHandle| {
                Err(NotFound("theme".to_string()).into())
            }));
        let set_key = quiet("select").step(from_fn(|ctx: &mut Ctx, _task: &mut TaskHandle| {
            ctx.file_key = Some("k".to_string());
            Ok(None)
        }));
        let mut workflow =
            Workflow::new(Ctx::default(), vec![tolerant, set_key, write_mapping()]);

        workflow.run().await.unwrap();
        let tasks = workflow.tasks();
        assert!(tasks[0].is_failed());
        assert!(tasks[1].is_completed());
        assert!(tasks[2].is_completed());
        assert_eq!(workflow.context().written, vec!["k"]);
    }

    #[tokio::test]
    async fn test_context_can_be_seeded_before_run() {
        let mut workflow = Workflow::new(Ctx::default(), vec![write_mapping()]);
        workflow.context_mut().file_key = Some("seeded".to_string());

        workflow.run().await.unwrap();
        assert_eq!(workflow.context().written, vec!["seeded"]);
    }

    #[tokio::test]
    async fn test_empty_workflow_succeeds() {
        let mut workflow: Workflow<Ctx> = Workflow::new(Ctx::default(), Vec::new());
        workflow.run().await.unwrap();
        assert!(workflow.tasks().is_empty());
    }
}
