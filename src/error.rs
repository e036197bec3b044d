//! Fault types raised on multiplexer API misuse.
//!
//! This module defines one enum:
//!
//! - [`Fault`] - lifecycle violations on a task handle.
//!
//! A fault is a programming error in the caller, not a runtime condition, so
//! the offending call panics with the fault's `Display` text instead of
//! returning an error. The [`Fault::as_label`] helper provides short stable
//! labels for logs/metrics.

use thiserror::Error;

/// # Task lifecycle misuse.
///
/// A task handle moves through a linear lifecycle: fresh, added, removed.
/// There is no re-add and no resurrection. Driving a handle against that
/// order faults; the panic message is the variant's `Display` output, so
/// tests can match on it with `#[should_panic(expected = ...)]`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Fault {
    /// The task was added before (or absorbed at shutdown) and cannot be added again.
    #[error("task {id} is already added to a multiplexer")]
    DuplicateTask {
        /// Id of the offending task handle.
        id: u64,
    },

    /// The task was never added, so there is nothing to remove.
    #[error("task {id} was never added to a multiplexer")]
    NotAdded {
        /// Id of the offending task handle.
        id: u64,
    },

    /// The task was already removed: explicitly, by source close, or by stop.
    #[error("task {id} has already been removed")]
    DoubleRemove {
        /// Id of the offending task handle.
        id: u64,
    },
}

impl Fault {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use chanmux::Fault;
    ///
    /// let fault = Fault::DuplicateTask { id: 7 };
    /// assert_eq!(fault.as_label(), "fault_duplicate_task");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Fault::DuplicateTask { .. } => "fault_duplicate_task",
            Fault::NotAdded { .. } => "fault_not_added",
            Fault::DoubleRemove { .. } => "fault_double_remove",
        }
    }

    /// Returns a human-readable message with the offending task id.
    ///
    /// # Example
    /// ```
    /// use chanmux::Fault;
    ///
    /// let fault = Fault::DoubleRemove { id: 3 };
    /// assert_eq!(fault.as_message(), "task 3 has already been removed");
    /// ```
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
