//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - one waitable source paired with handlers, type-erased
//! - [`TaskBuilder`] - fluent handler attachment
//! - [`TaskRef`] - shared reference to a task (`Arc<Task>`)
//! - [`InlineHandler`] / [`SpawnHandler`] - handler signatures

mod builder;
mod source;
mod task;

pub use builder::TaskBuilder;
pub use source::{InlineHandler, SpawnHandler};
pub use task::{Task, TaskRef};

pub(crate) use source::{Arrival, Source};
pub(crate) use task::Removal;
