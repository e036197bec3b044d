//! # Multiplexer configuration.
//!
//! Provides [`Config`] for channel sizing, plus the structural constants
//! that fix the geometry of a bucket's wait set.
//!
//! Config is consumed once, at
//! [`Multiplexer::with_config`](crate::Multiplexer::with_config). The wait-set
//! geometry ([`BUCKET_CAPACITY`], [`RESERVED_SLOTS`], [`USER_CAPACITY`]) is
//! part of the design, not configuration.
//!
//! ## Sentinel values
//! - `assignment_backlog = 0` → treated as 1 (a hand-off queue needs one slot)
//! - `removal_backlog = 0` → treated as 1
//! - `bus_capacity = 0` → treated as 1 (clamped by Bus as well)

/// Width of one bucket's wait set, control positions included.
///
/// One worker never waits on more than this many channels at once.
pub const BUCKET_CAPACITY: usize = 64;

/// Wait-set positions reserved for control: the stop broadcast, the shared
/// assignment intake, and the bucket's private removal intake.
pub const RESERVED_SLOTS: usize = 3;

/// User sources one bucket can hold: [`BUCKET_CAPACITY`] minus [`RESERVED_SLOTS`].
pub const USER_CAPACITY: usize = BUCKET_CAPACITY - RESERVED_SLOTS;

/// Channel sizing for a multiplexer instance.
///
/// Defines:
/// - **Assignment hand-off**: backlog of the shared queue buckets consume from
/// - **Removal routing**: backlog of each bucket's private removal channel
/// - **Event system**: bus capacity for lifecycle event delivery
///
/// ## Field semantics
/// - `assignment_backlog`: queued adds beyond this suspend the caller until a
///   bucket takes a task (`0` = treated as 1)
/// - `removal_backlog`: pending removal messages per bucket (`0` = treated as 1)
/// - `bus_capacity`: event bus ring buffer size (`0` = treated as 1)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the clamped accessors over
/// sprinkling sentinel checks (`0`) across callers.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the shared assignment queue.
    ///
    /// Small values keep routing tight: an add suspends in the queue until
    /// some bucket with a free slot accepts the task, so capacity checks
    /// stay close to reality. Larger values let bursts of adds complete
    /// before any bucket has picked the tasks up.
    pub assignment_backlog: usize,

    /// Capacity of each bucket's private removal channel.
    ///
    /// A removal suspends once this many removals are already pending on the
    /// same bucket.
    pub removal_backlog: usize,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// observe `RecvError::Lagged` and skip the oldest items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the assignment queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn assignment_backlog_clamped(&self) -> usize {
        self.assignment_backlog.max(1)
    }

    /// Returns the removal channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn removal_backlog_clamped(&self) -> usize {
        self.removal_backlog.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    ///
    /// The `Bus` should use this value to avoid constructing an invalid channel.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `assignment_backlog = 1` (tight hand-off; adds suspend until seated)
    /// - `removal_backlog = 16` (removals rarely queue up)
    /// - `bus_capacity = 256` (good baseline for lifecycle events)
    fn default() -> Self {
        Self {
            assignment_backlog: 1,
            removal_backlog: 16,
            bus_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_adds_up() {
        assert_eq!(
            USER_CAPACITY + RESERVED_SLOTS,
            BUCKET_CAPACITY,
            "user slots plus control positions must fill the wait set"
        );
    }

    #[test]
    fn test_zero_fields_clamp_to_one() {
        let cfg = Config {
            assignment_backlog: 0,
            removal_backlog: 0,
            bus_capacity: 0,
        };
        assert_eq!(cfg.assignment_backlog_clamped(), 1);
        assert_eq!(cfg.removal_backlog_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
