//! Bounded multi-wait over the user slots of one bucket.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::tasks::Arrival;

use super::bucket::Slot;

/// Waits for the first slot with something to report.
///
/// The scan starts at `from` and wraps, so no slot starves as long as the
/// caller rotates the start index. Resolves to the slot index and what
/// arrived there; with no slots installed it stays pending until the
/// surrounding select takes another branch.
pub(crate) fn next_arrival(slots: &mut [Slot], from: usize) -> NextArrival<'_> {
    NextArrival { slots, from }
}

pub(crate) struct NextArrival<'a> {
    slots: &'a mut [Slot],
    from: usize,
}

impl Future for NextArrival<'_> {
    type Output = (usize, Arrival);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let n = this.slots.len();
        for step in 0..n {
            let i = (this.from + step) % n;
            if let Poll::Ready(arrival) = this.slots[i].source.poll_arrival(cx) {
                return Poll::Ready((i, arrival));
            }
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use crate::tasks::{Task, TaskRef};

    use super::*;

    fn installed_slot(task: &TaskRef) -> Slot {
        let (removals, _keep) = mpsc::channel(1);
        let source = match task.take_source(0, 0, removals) {
            Some(source) => source,
            None => unreachable!("fresh added task always hands out its source"),
        };
        Slot {
            task: task.clone(),
            source,
        }
    }

    #[tokio::test]
    async fn test_reports_the_ready_slot() {
        let (_tx_a, rx_a) = mpsc::channel::<u8>(4);
        let (tx_b, rx_b) = mpsc::channel::<u8>(4);
        let a = Task::new(rx_a, None, None);
        let b = Task::new(rx_b, None, None);
        a.mark_added();
        b.mark_added();
        let mut slots = vec![installed_slot(&a), installed_slot(&b)];

        tx_b.send(7).await.unwrap();
        let (slot, arrival) = next_arrival(&mut slots, 0).await;
        assert_eq!(slot, 1, "second slot holds the ready source");
        assert_eq!(arrival, Arrival::Value);
        slots[slot].source.fire();
    }

    #[tokio::test]
    async fn test_close_is_an_arrival() {
        let (tx, rx) = mpsc::channel::<u8>(4);
        let task = Task::new(rx, None, None);
        task.mark_added();
        let mut slots = vec![installed_slot(&task)];

        drop(tx);
        let (slot, arrival) = next_arrival(&mut slots, 0).await;
        assert_eq!(slot, 0);
        assert_eq!(arrival, Arrival::Closed);
    }

    #[tokio::test]
    async fn test_scan_starts_at_the_offset() {
        let (tx_a, rx_a) = mpsc::channel::<u8>(4);
        let (tx_b, rx_b) = mpsc::channel::<u8>(4);
        let a = Task::new(rx_a, None, None);
        let b = Task::new(rx_b, None, None);
        a.mark_added();
        b.mark_added();
        let mut slots = vec![installed_slot(&a), installed_slot(&b)];

        tx_a.send(1).await.unwrap();
        tx_b.send(2).await.unwrap();
        let (slot, _) = next_arrival(&mut slots, 1).await;
        assert_eq!(slot, 1, "with both ready, the scan offset picks the winner");
        slots[slot].source.fire();
    }
}
