//! Codelink Core Library
//!
//! This is the core library for the Codelink command-line tool. It provides
//! the runtime every command is built on: tasks made of ordered steps, a
//! workflow that runs tasks over one shared context, live status output and
//! typed user-facing failures.
//!
//! ## Architecture
//!
//! - [`ui`] - Declarative status text and its rendering rules
//! - [`task`] - Task state machine and step runner
//! - [`step`] - The step trait, closure adapters and ready-made steps
//! - [`workflow`] - Sequential task runner
//! - [`error`] - [`TaskError`] for failing a step with a user-facing message
//! - [`display`] - Status display trait, terminal spinner and in-memory recorder
//! - [`context`] - Context fragments steps are written against
//! - [`configs`] - `codelink.yml` parsing
//! - [`types`] - Crate error type and result alias
//!
//! ## Usage
//!
//! ```rust,no_run
//! use codelink_core::step::{from_fn, transition_to};
//! use codelink_core::task::{Task, TaskHandle};
//! use codelink_core::workflow::Workflow;
//!
//! #[derive(Default)]
//! struct Ctx {
//!     components: Vec<String>,
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let scan = Task::new("scan")
//!     .initial("Scanning components")
//!     .step(from_fn(|ctx: &mut Ctx, _task: &mut TaskHandle| {
//!         ctx.components.push("Button".to_string());
//!         Ok(None)
//!     }))
//!     .step(transition_to("Found components"));
//!
//! let mut workflow = Workflow::new(Ctx::default(), vec![scan]);
//! workflow.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod context;
pub mod display;
pub mod error;
pub mod step;
pub mod task;
pub mod types;
pub mod ui;
pub mod workflow;

// Re-export the main types for easier usage
pub use error::{is_task_error, TaskError};
pub use task::{SkipDecision, Task, TaskHandle, TaskState};
pub use types::{CodelinkError, CodelinkResult};
pub use ui::{Rendered, Template, Text, Ui};
pub use workflow::Workflow;
