//! # Lifecycle events emitted by the multiplexer and its bucket workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Shutdown events**: the stop sequence
//! - **Bucket events**: worker spawn, intake pause/resume, wind-down
//! - **Task events**: add, install, close, removal, shutdown absorption
//!
//! The [`Event`] struct carries the context of the moment: the task id, the
//! bucket and slot involved, and a snapshot of the live-task count.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! observed out of order. Events that settle the live count (`TaskClosed`,
//! `TaskRemoved`, `TaskAbsorbed`, `BucketStopped`) are published after the
//! decrement, so `tracked` snapshots read as settled values.
//!
//! ## Example
//! ```rust
//! use chanmux::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskInstalled)
//!     .with_task(7)
//!     .with_bucket(0)
//!     .with_slot(3);
//!
//! assert_eq!(ev.kind, EventKind::TaskInstalled);
//! assert_eq!(ev.task, Some(7));
//! assert_eq!(ev.slot, Some(3));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Shutdown events ===
    /// Stop requested; the cancellation broadcast is about to fire.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StopRequested,

    // === Bucket events ===
    /// A bucket worker was spawned (seeded with its first task).
    ///
    /// Sets:
    /// - `bucket`: bucket id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BucketSpawned,

    /// A bucket reached capacity and paused its assignment intake.
    ///
    /// Sets:
    /// - `bucket`: bucket id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BucketPaused,

    /// A full bucket freed a slot and resumed its assignment intake.
    ///
    /// Sets:
    /// - `bucket`: bucket id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BucketResumed,

    /// A bucket drained its slots and exited. Tasks discarded by the drain
    /// are not announced individually.
    ///
    /// Sets:
    /// - `bucket`: bucket id
    /// - `tracked`: live count after the drain
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BucketStopped,

    // === Task events ===
    /// A task was accepted and counted; routing comes next.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `tracked`: live count including this task
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskAdded,

    /// A task landed in a bucket slot and is being waited on.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `bucket`: bucket id
    /// - `slot`: slot index
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskInstalled,

    /// A task's source closed; the final `None` was dispatched and the slot
    /// torn down.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `bucket`: bucket id
    /// - `slot`: slot index that was vacated
    /// - `tracked`: live count after the teardown
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskClosed,

    /// A task was removed on request.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `bucket`/`slot`: set when a worker vacated an installed slot,
    ///   absent when the task was still queued
    /// - `tracked`: live count after the removal
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskRemoved,

    /// A task was swallowed by shutdown before reaching a slot.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `bucket`: set when a draining bucket did the absorbing
    /// - `tracked`: live count after the absorption
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskAbsorbed,
}

/// Lifecycle event with optional context.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Id of the task involved, if any.
    pub task: Option<u64>,
    /// Bucket involved, if any.
    pub bucket: Option<usize>,
    /// Slot index involved, if any.
    pub slot: Option<usize>,
    /// Snapshot of the live-task count right after the transition.
    pub tracked: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            bucket: None,
            slot: None,
            tracked: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, id: u64) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches a bucket id.
    #[inline]
    pub fn with_bucket(mut self, bucket: usize) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Attaches a slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a live-count snapshot.
    #[inline]
    pub fn with_tracked(mut self, tracked: usize) -> Self {
        self.tracked = Some(tracked);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let first = Event::new(EventKind::StopRequested);
        let second = Event::new(EventKind::StopRequested);
        assert!(
            second.seq > first.seq,
            "seq must increase across events: {} then {}",
            first.seq,
            second.seq
        );
    }

    #[test]
    fn test_builders_leave_unset_fields_empty() {
        let ev = Event::new(EventKind::BucketSpawned).with_bucket(2);
        assert_eq!(ev.bucket, Some(2));
        assert_eq!(ev.task, None, "task id should stay unset");
        assert_eq!(ev.slot, None, "slot should stay unset");
        assert_eq!(ev.tracked, None, "tracked snapshot should stay unset");
    }
}
