//! Live-task accounting shared by the multiplexer and its bucket workers.

use std::sync::atomic::{AtomicI64, Ordering};

/// Lock-free count of live tasks.
///
/// Incremented optimistically at add time and decremented exactly once per
/// counted task when it leaves (removal, close, or drain). Reads are
/// advisory: concurrent adds may briefly overshoot, and the public view
/// clamps at zero.
#[derive(Debug, Default)]
pub(crate) struct Tracked {
    live: AtomicI64,
}

impl Tracked {
    pub(crate) fn new() -> Self {
        Self {
            live: AtomicI64::new(0),
        }
    }

    /// Counts one task in and returns the new total.
    pub(crate) fn increment(&self) -> i64 {
        self.live.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Counts one task out.
    pub(crate) fn decrement(&self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current live count, clamped at zero.
    pub(crate) fn current(&self) -> usize {
        self.live.load(Ordering::Relaxed).max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_in_and_out() {
        let tracked = Tracked::new();
        assert_eq!(tracked.increment(), 1);
        assert_eq!(tracked.increment(), 2);
        tracked.decrement();
        assert_eq!(tracked.current(), 1, "one task should remain counted");
    }

    #[test]
    fn test_current_clamps_at_zero() {
        let tracked = Tracked::new();
        tracked.decrement();
        assert_eq!(tracked.current(), 0, "advisory view never goes negative");
    }
}
