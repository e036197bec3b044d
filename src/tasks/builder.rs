//! Fluent construction of tasks.
//!
//! [`TaskBuilder`] keeps the payload type around while handlers are attached,
//! then erases it in [`TaskBuilder::build`]. Prefer it over [`Task::new`]
//! unless you already hold boxed handlers.

use std::future::Future;

use futures::FutureExt;
use tokio::sync::mpsc;

use super::source::{InlineHandler, SpawnHandler};
use super::task::{Task, TaskRef};

/// Builder for [`Task`] handles with a fluent API.
///
/// # Example
/// ```
/// use chanmux::Task;
/// use tokio::sync::mpsc;
///
/// let (_tx, rx) = mpsc::channel::<String>(8);
/// let task = Task::builder(rx)
///     .for_each(|line| {
///         if let Some(line) = line {
///             println!("got: {line}");
///         }
///     })
///     .build();
/// assert!(!task.is_added());
/// ```
pub struct TaskBuilder<T> {
    source: mpsc::Receiver<T>,
    inline: Option<InlineHandler<T>>,
    spawned: Option<SpawnHandler<T>>,
}

impl<T: Clone + Send + 'static> TaskBuilder<T> {
    /// Creates a new builder around a receiver.
    pub fn new(source: mpsc::Receiver<T>) -> Self {
        Self {
            source,
            inline: None,
            spawned: None,
        }
    }

    /// Attaches the inline handler, run synchronously on the bucket worker.
    pub fn for_each<F>(mut self, handler: F) -> Self
    where
        F: FnMut(Option<T>) + Send + 'static,
    {
        self.inline = Some(Box::new(handler));
        self
    }

    /// Attaches the spawned handler; each delivery launches the returned
    /// future as a detached tokio task.
    pub fn for_each_concurrent<F, Fut>(mut self, mut handler: F) -> Self
    where
        F: FnMut(Option<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawned = Some(Box::new(move |value| handler(value).boxed()));
        self
    }

    /// Erases the payload type and produces the shareable handle.
    pub fn build(self) -> TaskRef {
        Task::new(self.source, self.inline, self.spawned)
    }
}

impl Task {
    /// Creates a builder for constructing a task with a fluent API.
    pub fn builder<T>(source: mpsc::Receiver<T>) -> TaskBuilder<T>
    where
        T: Clone + Send + 'static,
    {
        TaskBuilder::new(source)
    }
}
