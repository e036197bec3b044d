//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the multiplexer and its
//! bucket workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Multiplexer` (add/remove/stop paths), bucket workers
//!   (install, close, removal, pause/resume, wind-down).
//! - **Consumers**: receivers handed out by `Multiplexer::subscribe()`;
//!   nothing inside the crate consumes its own events.
//!
//! See the crate docs for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
