//! # The multiplexer.
//!
//! Entry point tying the pieces together: callers add and remove tasks, the
//! shared assignment queue hands tasks to whichever bucket has room, and
//! spillover spawns fresh buckets seeded directly.
//!
//! ```text
//!            add(task)
//!                │
//!     fits current seats? ──no──► spawn bucket (seeded with the task)
//!                │ yes
//!                ▼
//!        assignment queue ◄────── competing consumers: every bucket
//!        (bounded hand-off)       with a free slot
//! ```
//!
//! ## Rules
//! - `count <= buckets * USER_CAPACITY` decides routing. The count is
//!   optimistic, so concurrent adds can briefly overshoot and spawn a bucket
//!   that strictly was not needed; routing never underprovisions.
//! - A queued add suspends in the hand-off until a bucket takes the task.
//!   Full buckets pause their intake, so a hand-off always lands on real
//!   room.
//! - Capacity exhaustion never reaches the caller; `add` has no error path.
//! - `stop` is idempotent: flag, cancel, then drain residual queue entries.
//!   Buckets drain themselves on their own schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Removal, TaskRef};

use super::bucket::Bucket;
use super::config::{Config, USER_CAPACITY};
use super::tracked::Tracked;

/// Selective fan-in over many channel sources.
///
/// All methods take `&self`; wrap the multiplexer in an [`Arc`] to share it
/// across tasks. See the crate docs for the full model.
pub struct Multiplexer {
    cfg: Config,
    /// Buckets spawned so far. Buckets are never reaped, so until stop this
    /// is also the live bucket count.
    buckets: Mutex<usize>,
    assign_tx: flume::Sender<TaskRef>,
    /// Master receiver: cloned into every bucket, drained once more at stop.
    assign_rx: flume::Receiver<TaskRef>,
    tracked: Arc<Tracked>,
    stop_token: CancellationToken,
    stopped: AtomicBool,
    bus: Bus,
}

impl Multiplexer {
    /// Creates a multiplexer with default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a multiplexer with explicit channel sizing.
    pub fn with_config(cfg: Config) -> Self {
        let (assign_tx, assign_rx) = flume::bounded(cfg.assignment_backlog_clamped());
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            buckets: Mutex::new(0),
            assign_tx,
            assign_rx,
            tracked: Arc::new(Tracked::new()),
            stop_token: CancellationToken::new(),
            stopped: AtomicBool::new(false),
            bus,
        }
    }

    /// Registers a task and suspends until a bucket is responsible for it.
    ///
    /// Capacity is handled internally: if every bucket is full, a new one is
    /// spawned seeded with this task. After [`Multiplexer::stop`] the task is
    /// absorbed silently and never counted.
    ///
    /// # Panics
    /// With [`Fault::DuplicateTask`](crate::Fault::DuplicateTask) if this
    /// handle was added before.
    pub async fn add(&self, task: TaskRef) {
        task.mark_added();
        if self.stopped.load(Ordering::Acquire) {
            task.absorb();
            self.bus.publish(
                Event::new(EventKind::TaskAbsorbed)
                    .with_task(task.id())
                    .with_tracked(self.tracked.current()),
            );
            return;
        }
        let live = self.tracked.increment();
        self.bus.publish(
            Event::new(EventKind::TaskAdded)
                .with_task(task.id())
                .with_tracked(live.max(0) as usize),
        );
        let fits = {
            let buckets = self.buckets.lock();
            live as usize <= *buckets * USER_CAPACITY
        };
        if fits {
            let queued = task.clone();
            tokio::select! {
                _ = self.assign_tx.send_async(task) => {}
                _ = self.stop_token.cancelled() => {
                    // Stop won the race; settle the count here unless a
                    // bucket managed to install the task first.
                    if queued.absorb() {
                        self.tracked.decrement();
                        self.bus.publish(
                            Event::new(EventKind::TaskAbsorbed)
                                .with_task(queued.id())
                                .with_tracked(self.tracked.current()),
                        );
                    }
                }
            }
        } else {
            self.spawn_bucket(task);
        }
    }

    /// Cancels monitoring of one task.
    ///
    /// A task still sitting in the assignment queue is settled here and the
    /// eventual consumer drops the stale entry; an installed task is torn
    /// down by its owning worker on its own schedule. A value the worker has
    /// already accepted may still be delivered, so cancellation is prompt
    /// but not synchronous.
    ///
    /// # Panics
    /// With [`Fault::NotAdded`](crate::Fault::NotAdded) if the task was never
    /// added, or [`Fault::DoubleRemove`](crate::Fault::DoubleRemove) if it was
    /// already removed (explicitly, by source close, or by stop).
    pub async fn remove(&self, task: &TaskRef) {
        match task.begin_remove() {
            Removal::Unplaced => {
                self.tracked.decrement();
                self.bus.publish(
                    Event::new(EventKind::TaskRemoved)
                        .with_task(task.id())
                        .with_tracked(self.tracked.current()),
                );
            }
            Removal::Placed(removals) => {
                // A failed send means the bucket already wound down and
                // settled the task while draining.
                let _ = removals.send(task.clone()).await;
            }
        }
    }

    /// Number of live tasks.
    ///
    /// Advisory: concurrent adds can briefly overshoot, and teardown settles
    /// once workers process in-flight transitions.
    pub fn count(&self) -> usize {
        self.tracked.current()
    }

    /// Number of buckets spawned so far.
    pub fn bucket_count(&self) -> usize {
        *self.buckets.lock()
    }

    /// True once [`Multiplexer::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stops every bucket and absorbs whatever never reached one.
    ///
    /// Idempotent. Buckets observe the cancellation on their own schedule,
    /// drain, and exit; the count trends to zero. Spawned handler futures
    /// already launched keep running to completion.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.bus.publish(Event::new(EventKind::StopRequested));
        self.stop_token.cancel();
        while let Ok(task) = self.assign_rx.try_recv() {
            if task.absorb() {
                self.tracked.decrement();
                self.bus.publish(
                    Event::new(EventKind::TaskAbsorbed)
                        .with_task(task.id())
                        .with_tracked(self.tracked.current()),
                );
            }
        }
    }

    /// Creates a new receiver observing subsequent lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Spawns a bucket seeded with `task`, bypassing the queue.
    fn spawn_bucket(&self, seed: TaskRef) {
        let id = {
            let mut buckets = self.buckets.lock();
            let id = *buckets;
            *buckets += 1;
            Bucket::spawn(
                id,
                seed,
                self.assign_rx.clone(),
                self.stop_token.clone(),
                self.tracked.clone(),
                self.bus.clone(),
                &self.cfg,
            );
            id
        };
        self.bus
            .publish(Event::new(EventKind::BucketSpawned).with_bucket(id));
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}
