//! Runtime core: routing, buckets, accounting.
//!
//! This module contains the embedded implementation of the multiplexer
//! runtime. The public API from this module is [`Multiplexer`] plus the
//! [`Config`] it is built from and the wait-set geometry constants.
//!
//! Internal modules:
//! - `multiplexer`: add/remove entry points, routing math, stop;
//! - `bucket`: one worker per bucket, blocked in a bounded multi-wait;
//! - `wait`: the rotating scan over installed user slots;
//! - `tracked`: lock-free live-task counter shared with the workers.

mod bucket;
mod config;
mod multiplexer;
mod tracked;
mod wait;

pub use config::{BUCKET_CAPACITY, Config, RESERVED_SLOTS, USER_CAPACITY};
pub use multiplexer::Multiplexer;
