//! # Task handles and their lifecycle.
//!
//! A [`Task`] pairs one waitable source with its handlers and remembers where
//! it currently lives. Handles move through a linear lifecycle:
//!
//! ```text
//! fresh ──add──► added ──remove / close / stop──► removed
//! ```
//!
//! ## Rules
//! - A handle is added at most once and never resurrected; driving it against
//!   the lifecycle panics with a [`Fault`] message.
//! - `phase` and `home` can be read by any caller (remove, diagnostics), so
//!   they live behind a short mutex.
//! - `home` is written only by the bucket worker that owns the slot; the
//!   placement recorded there routes removal messages.
//! - The erased source travels with the handle until a worker installs it;
//!   `take_source` is the single hand-off point.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::Fault;

use super::source::{InlineHandler, Source, SpawnHandler, TypedSource};

/// Process-wide id source for task handles.
static TASK_IDS: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a task. Keep a clone if you intend to remove the task.
pub type TaskRef = Arc<Task>;

/// Lifecycle phase of a task handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Added,
    Removed,
}

/// Where an installed task currently sits.
struct Placement {
    bucket: usize,
    slot: usize,
    removals: mpsc::Sender<TaskRef>,
}

/// How a removal must be routed, decided by `begin_remove`.
pub(crate) enum Removal {
    /// Never installed (still queued); the caller settles the count and the
    /// eventual consumer drops the stale entry.
    Unplaced,
    /// Installed in a bucket; send the handle down this removal channel.
    Placed(mpsc::Sender<TaskRef>),
}

struct State {
    phase: Phase,
    home: Option<Placement>,
    /// Present from construction until a worker installs the task.
    source: Option<Box<dyn Source>>,
}

/// One registered source plus its handlers.
///
/// Construct via [`Task::new`] or [`Task::builder`], then register with
/// [`Multiplexer::add`](crate::Multiplexer::add).
pub struct Task {
    id: u64,
    state: Mutex<State>,
}

impl Task {
    /// Creates a task from a receiver and up to two handlers.
    ///
    /// The payload type is erased here; afterwards the handle is uniform.
    /// `inline` runs on the bucket worker per delivery; `spawned` is launched
    /// as a detached tokio task per delivery. Either may be `None`.
    pub fn new<T>(
        source: mpsc::Receiver<T>,
        inline: Option<InlineHandler<T>>,
        spawned: Option<SpawnHandler<T>>,
    ) -> TaskRef
    where
        T: Clone + Send + 'static,
    {
        Arc::new(Self {
            id: TASK_IDS.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(State {
                phase: Phase::Fresh,
                home: None,
                source: Some(Box::new(TypedSource::new(source, inline, spawned))),
            }),
        })
    }

    /// Unique id of this handle (events, fault messages).
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True while the task is registered and not yet removed.
    pub fn is_added(&self) -> bool {
        self.state.lock().phase == Phase::Added
    }

    /// True once the task was removed, closed, or absorbed at shutdown.
    pub fn is_removed(&self) -> bool {
        self.state.lock().phase == Phase::Removed
    }

    /// Fresh → Added. Panics with [`Fault::DuplicateTask`] otherwise.
    pub(crate) fn mark_added(&self) {
        let mut state = self.state.lock();
        if state.phase != Phase::Fresh {
            panic!("{}", Fault::DuplicateTask { id: self.id });
        }
        state.phase = Phase::Added;
    }

    /// Added → Removed, reporting how the removal must be routed.
    ///
    /// Panics with [`Fault::NotAdded`] on a fresh handle and with
    /// [`Fault::DoubleRemove`] on an already-removed one.
    pub(crate) fn begin_remove(&self) -> Removal {
        let mut state = self.state.lock();
        match state.phase {
            Phase::Fresh => panic!("{}", Fault::NotAdded { id: self.id }),
            Phase::Removed => panic!("{}", Fault::DoubleRemove { id: self.id }),
            Phase::Added => {
                state.phase = Phase::Removed;
                match &state.home {
                    Some(placement) => Removal::Placed(placement.removals.clone()),
                    None => Removal::Unplaced,
                }
            }
        }
    }

    /// Added-and-unplaced → Removed without routing; true if this call made
    /// the transition. Shutdown absorption and stale-entry cleanup go through
    /// here; the verdict is what keeps the count settled exactly once per
    /// task.
    pub(crate) fn absorb(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase == Phase::Added && state.home.is_none() {
            state.phase = Phase::Removed;
            true
        } else {
            false
        }
    }

    /// Hands the erased source to the installing worker and records the
    /// placement. Returns `None` if the task died while queued; the worker
    /// must then drop the handle without installing it.
    pub(crate) fn take_source(
        &self,
        bucket: usize,
        slot: usize,
        removals: mpsc::Sender<TaskRef>,
    ) -> Option<Box<dyn Source>> {
        let mut state = self.state.lock();
        if state.phase != Phase::Added {
            return None;
        }
        let source = state.source.take()?;
        state.home = Some(Placement {
            bucket,
            slot,
            removals,
        });
        Some(source)
    }

    /// Updates the recorded slot after a swap-remove moved this task.
    pub(crate) fn relocate(&self, slot: usize) {
        if let Some(placement) = self.state.lock().home.as_mut() {
            placement.slot = slot;
        }
    }

    /// Current slot in the given bucket, if still installed there.
    pub(crate) fn placement_slot(&self, bucket: usize) -> Option<usize> {
        let state = self.state.lock();
        state
            .home
            .as_ref()
            .filter(|placement| placement.bucket == bucket)
            .map(|placement| placement.slot)
    }

    /// Clears the placement and forces Removed. Called by the owning worker
    /// when the slot is torn down (removal, close, or drain).
    pub(crate) fn detach(&self) {
        let mut state = self.state.lock();
        state.home = None;
        state.phase = Phase::Removed;
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("phase", &state.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_task() -> TaskRef {
        let (_tx, rx) = mpsc::channel::<u32>(1);
        Task::new(rx, None, None)
    }

    fn removal_channel() -> mpsc::Sender<TaskRef> {
        let (tx, _rx) = mpsc::channel(1);
        tx
    }

    #[test]
    fn test_ids_are_unique() {
        let a = fresh_task();
        let b = fresh_task();
        assert_ne!(a.id(), b.id(), "every handle should get its own id");
    }

    #[test]
    #[should_panic(expected = "already added")]
    fn test_double_add_panics() {
        let task = fresh_task();
        task.mark_added();
        task.mark_added();
    }

    #[test]
    #[should_panic(expected = "never added")]
    fn test_remove_fresh_panics() {
        let task = fresh_task();
        let _ = task.begin_remove();
    }

    #[test]
    #[should_panic(expected = "already been removed")]
    fn test_double_remove_panics() {
        let task = fresh_task();
        task.mark_added();
        let _ = task.begin_remove();
        let _ = task.begin_remove();
    }

    #[test]
    fn test_unplaced_removal_is_reported() {
        let task = fresh_task();
        task.mark_added();
        assert!(matches!(task.begin_remove(), Removal::Unplaced));
        assert!(task.is_removed(), "phase should land on removed");
    }

    #[test]
    fn test_placed_removal_hands_out_the_channel() {
        let task = fresh_task();
        task.mark_added();
        assert!(task.take_source(1, 0, removal_channel()).is_some());
        assert!(matches!(task.begin_remove(), Removal::Placed(_)));
    }

    #[test]
    fn test_absorb_transitions_exactly_once() {
        let task = fresh_task();
        task.mark_added();
        assert!(task.absorb(), "first absorb should transition");
        assert!(!task.absorb(), "second absorb must be a no-op");
    }

    #[test]
    fn test_take_source_refuses_dead_task() {
        let task = fresh_task();
        task.mark_added();
        let _ = task.begin_remove();
        assert!(
            task.take_source(0, 0, removal_channel()).is_none(),
            "a removed task must not install"
        );
    }

    #[test]
    fn test_relocate_and_detach_track_the_slot() {
        let task = fresh_task();
        task.mark_added();
        assert!(task.take_source(0, 5, removal_channel()).is_some());
        assert_eq!(task.placement_slot(0), Some(5));
        assert_eq!(task.placement_slot(1), None, "wrong bucket should miss");

        task.relocate(2);
        assert_eq!(task.placement_slot(0), Some(2));

        task.detach();
        assert_eq!(task.placement_slot(0), None);
        assert!(task.is_removed());
    }
}
