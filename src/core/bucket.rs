//! # Bucket workers.
//!
//! A bucket is one worker task blocked in a bounded multi-way wait. The wait
//! set is [`BUCKET_CAPACITY`](super::config::BUCKET_CAPACITY) wide: three
//! positions carry control traffic and the rest hold user sources.
//!
//! ```text
//! one select iteration
//! ├── stop token          cancellation broadcast from the multiplexer
//! ├── removal intake      this bucket's private channel
//! ├── assignment intake   shared queue; paused while the bucket is full
//! └── user slots 0..=60   erased sources, scanned from a rotating start
//! ```
//!
//! ## Rules
//! - Exactly one ready event is consumed per iteration.
//! - Only this worker mutates the slot array. Removal is swap-with-last;
//!   the displaced task's recorded slot is updated under that task's lock.
//! - At capacity the assignment branch is disabled, so a full bucket never
//!   takes a hand-off it cannot seat. Queued adds wait for real room.
//! - An empty bucket keeps waiting; buckets are only torn down at stop.
//! - Wind-down drains the visible assignment backlog, then discards every
//!   slot, decrementing the live count per task. Close callbacks do not
//!   fire for drained tasks.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Arrival, Source, TaskRef};

use super::config::{Config, USER_CAPACITY};
use super::tracked::Tracked;
use super::wait::next_arrival;

/// One installed user source.
pub(crate) struct Slot {
    pub(crate) task: TaskRef,
    pub(crate) source: Box<dyn Source>,
}

/// One consumed wait event.
enum Wakeup {
    Stop,
    Assignment(Option<TaskRef>),
    Removal(Option<TaskRef>),
    Arrival { slot: usize, arrival: Arrival },
}

pub(crate) struct Bucket {
    id: usize,
    slots: Vec<Slot>,
    /// Kept so installed tasks can route removals here; also keeps the
    /// removal channel open for the bucket's whole life.
    removal_tx: mpsc::Sender<TaskRef>,
    removals: mpsc::Receiver<TaskRef>,
    assignments: flume::Receiver<TaskRef>,
    stop: CancellationToken,
    tracked: Arc<Tracked>,
    bus: Bus,
}

impl Bucket {
    /// Spawns the worker, seeded with its first task. The seed bypasses the
    /// shared queue so a fresh bucket makes progress immediately.
    pub(crate) fn spawn(
        id: usize,
        seed: TaskRef,
        assignments: flume::Receiver<TaskRef>,
        stop: CancellationToken,
        tracked: Arc<Tracked>,
        bus: Bus,
        cfg: &Config,
    ) {
        let (removal_tx, removals) = mpsc::channel(cfg.removal_backlog_clamped());
        let bucket = Self {
            id,
            slots: Vec::with_capacity(USER_CAPACITY),
            removal_tx,
            removals,
            assignments,
            stop,
            tracked,
            bus,
        };
        tokio::spawn(bucket.run(seed));
    }

    async fn run(mut self, seed: TaskRef) {
        self.install(seed);
        loop {
            let has_room = self.slots.len() < USER_CAPACITY;
            let from = if self.slots.is_empty() {
                0
            } else {
                rand::rng().random_range(0..self.slots.len())
            };
            let wakeup = tokio::select! {
                _ = self.stop.cancelled() => Wakeup::Stop,
                msg = self.removals.recv() => Wakeup::Removal(msg),
                msg = self.assignments.recv_async(), if has_room => Wakeup::Assignment(msg.ok()),
                (slot, arrival) = next_arrival(&mut self.slots, from) => Wakeup::Arrival { slot, arrival },
            };
            match wakeup {
                // A closed control channel means the multiplexer is gone;
                // treat it like stop.
                Wakeup::Stop | Wakeup::Assignment(None) | Wakeup::Removal(None) => {
                    self.wind_down();
                    return;
                }
                Wakeup::Assignment(Some(task)) => self.install(task),
                Wakeup::Removal(Some(task)) => {
                    if let Some(slot) = task.placement_slot(self.id) {
                        self.discard(slot, EventKind::TaskRemoved);
                    }
                }
                Wakeup::Arrival {
                    slot,
                    arrival: Arrival::Value,
                } => {
                    self.slots[slot].source.fire();
                }
                Wakeup::Arrival {
                    slot,
                    arrival: Arrival::Closed,
                } => {
                    self.slots[slot].source.fire_closed();
                    self.discard(slot, EventKind::TaskClosed);
                }
            }
        }
    }

    /// Installs a task into the next free slot. A task that died while
    /// queued arrives here already removed; it is dropped silently, its
    /// count settled by whoever removed it.
    fn install(&mut self, task: TaskRef) {
        debug_assert!(self.slots.len() < USER_CAPACITY, "install past capacity");
        let id = task.id();
        let slot = self.slots.len();
        if let Some(source) = task.take_source(self.id, slot, self.removal_tx.clone()) {
            self.slots.push(Slot { task, source });
            self.bus.publish(
                Event::new(EventKind::TaskInstalled)
                    .with_task(id)
                    .with_bucket(self.id)
                    .with_slot(slot),
            );
            if self.slots.len() == USER_CAPACITY {
                self.bus
                    .publish(Event::new(EventKind::BucketPaused).with_bucket(self.id));
            }
        }
    }

    /// Swap-removes a slot, settles the count, and keeps the displaced
    /// task's recorded slot accurate.
    fn discard(&mut self, slot: usize, kind: EventKind) {
        let was_full = self.slots.len() == USER_CAPACITY;
        let removed = self.slots.swap_remove(slot);
        removed.task.detach();
        self.tracked.decrement();
        self.bus.publish(
            Event::new(kind)
                .with_task(removed.task.id())
                .with_bucket(self.id)
                .with_slot(slot)
                .with_tracked(self.tracked.current()),
        );
        if let Some(moved) = self.slots.get(slot) {
            moved.task.relocate(slot);
        }
        if was_full {
            self.bus
                .publish(Event::new(EventKind::BucketResumed).with_bucket(self.id));
        }
    }

    /// Drains everything this worker can see and exits: stale queued
    /// assignments first, then every installed slot. Drained tasks get no
    /// close callbacks.
    fn wind_down(&mut self) {
        while let Ok(task) = self.assignments.try_recv() {
            if task.absorb() {
                self.tracked.decrement();
                self.bus.publish(
                    Event::new(EventKind::TaskAbsorbed)
                        .with_task(task.id())
                        .with_bucket(self.id)
                        .with_tracked(self.tracked.current()),
                );
            }
        }
        for slot in self.slots.drain(..) {
            slot.task.detach();
            self.tracked.decrement();
        }
        self.bus.publish(
            Event::new(EventKind::BucketStopped)
                .with_bucket(self.id)
                .with_tracked(self.tracked.current()),
        );
    }
}
