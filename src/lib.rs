//! # chanmux
//!
//! **chanmux** is a selective fan-in library for Rust: register any number of
//! tasks (a channel receiver paired with callbacks) and a small set of bucket
//! workers watches all of them, each blocked in one bounded multi-way wait.
//!
//! It provides primitives to add and remove sources dynamically, dispatch
//! each value to its task's handlers at most once, and drain everything on
//! stop. The crate is designed as a building block for event routers and
//! subscription fan-in layers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Task     │   │     Task     │   │     Task     │
//!     │ (receiver +  │   │ (receiver +  │   │ (receiver +  │
//!     │  handlers)   │   │  handlers)   │   │  handlers)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  Multiplexer                                              │
//! │  - Tracked (lock-free live-task count)                    │
//! │  - assignment queue (bounded MPMC, competing consumers)   │
//! │  - stop token (cancellation broadcast)                    │
//! │  - Bus (broadcast events)                                 │
//! └──────┬──────────────────┬──────────────────┬──────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Bucket 0   │   │   Bucket 1   │   │   Bucket N   │
//!     │  wait set:   │   │              │   │ (spawned on  │
//!     │  3 control + │   │     ...      │   │  spillover)  │
//!     │  61 sources  │   │              │   │              │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ dispatch         │                  │
//!      ▼                  ▼                  ▼
//!   inline handler (on the worker) / spawned handler (detached task)
//! ```
//!
//! ### Lifecycle
//! ```text
//! add(task) ──► count + 1 ──► fits seats? ──► assignment queue ──► install
//!                                 └── no ──► spawn bucket (seeded with task)
//!
//! loop {            // one bucket worker
//!   ├─► select over: stop │ removals │ assignments (only if room) │ sources
//!   ├─ value arrived ──► fire handlers (inline now, spawned detached)
//!   ├─ source closed ──► fire one None, swap-remove the slot, count - 1
//!   ├─ removal msg   ──► swap-remove the slot, count - 1
//!   ├─ assignment    ──► install into the next free slot
//!   └─ stop          ──► drain queue and slots, exit
//! }
//! ```
//!
//! ## Features
//! | Area               | Description                                                   | Key types / constants                      |
//! |--------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Registration**   | Add and remove tasks at any time; misuse faults loudly.       | [`Multiplexer`], [`Task`], [`TaskBuilder`] |
//! | **Bounded waiting**| One worker never waits on more than 64 channels at once.      | [`BUCKET_CAPACITY`], [`USER_CAPACITY`]     |
//! | **Dispatch**       | At-most-once per value; sync and async handlers per task.     | [`InlineHandler`], [`SpawnHandler`]        |
//! | **Events**         | Lifecycle stream for tests, logging, and diagnostics.         | [`Event`], [`EventKind`], [`Bus`]          |
//! | **Faults**         | Typed misuse taxonomy behind stable panic messages.           | [`Fault`]                                  |
//! | **Configuration**  | Channel sizing knobs with sentinel clamping.                  | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use chanmux::{Multiplexer, Task};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mux = Multiplexer::new();
//!
//!     let (tx, rx) = mpsc::channel::<u32>(8);
//!     let task = Task::builder(rx)
//!         .for_each(|value| match value {
//!             Some(n) => println!("value: {n}"),
//!             None => println!("source closed"),
//!         })
//!         .build();
//!
//!     mux.add(task).await;
//!     assert_eq!(mux.count(), 1);
//!
//!     tx.send(1).await.unwrap();
//!     tx.send(2).await.unwrap();
//!     drop(tx); // closing the source tears the task down
//!
//!     while mux.count() > 0 {
//!         tokio::time::sleep(std::time::Duration::from_millis(5)).await;
//!     }
//!     mux.stop();
//! }
//! ```
mod core;
mod error;
mod events;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{BUCKET_CAPACITY, Config, Multiplexer, RESERVED_SLOTS, USER_CAPACITY};
pub use crate::error::Fault;
pub use crate::events::{Bus, Event, EventKind};
pub use crate::tasks::{InlineHandler, SpawnHandler, Task, TaskBuilder, TaskRef};
