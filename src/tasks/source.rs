//! # Type erasure for waitable sources.
//!
//! A task is generic over its payload only at construction. [`TypedSource`]
//! captures the receiver together with both handlers and hides the payload
//! behind the crate-private [`Source`] object, so bucket workers can hold
//! heterogeneous sources in one slot array.
//!
//! ## Rules
//! - `poll_arrival` moves a ready value into the `staged` buffer and reports
//!   [`Arrival::Value`]; the value itself never crosses the erased boundary.
//! - `fire` drains `staged` into the handlers. The buffer is vacated before
//!   the slot is ever waited on again, so a slot never holds two values.
//! - A closed receiver reports [`Arrival::Closed`]; `fire_closed` hands one
//!   final `None` to each handler.
//! - Handlers run on the bucket worker; a spawned handler's future goes to
//!   `tokio::spawn` and is never awaited in place.

use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio::sync::mpsc;

/// Synchronous handler, run inline on the bucket worker per delivery.
///
/// Receives `Some(value)` per arrival and `None` exactly once if the source
/// closes. Long work here delays every other source in the same bucket.
pub type InlineHandler<T> = Box<dyn FnMut(Option<T>) + Send>;

/// Asynchronous handler, launched as a detached task per delivery.
///
/// Receives the same `Option` contract as [`InlineHandler`]; invocations are
/// launched in per-source order but scheduled freely by the runtime.
pub type SpawnHandler<T> = Box<dyn FnMut(Option<T>) -> BoxFuture<'static, ()> + Send>;

/// What a wait on one source produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// A value is staged inside the source, ready to fire.
    Value,
    /// All senders are gone; the source will never produce again.
    Closed,
}

/// Object-safe face of a typed source: poll for readiness, then dispatch.
pub(crate) trait Source: Send {
    /// Polls the underlying receiver. On `Ready(Arrival::Value)` the value
    /// has been moved into the staged buffer and must be dispatched via
    /// [`Source::fire`] before the slot is polled again.
    fn poll_arrival(&mut self, cx: &mut Context<'_>) -> Poll<Arrival>;

    /// Dispatches the staged value to the handlers. No-op if nothing is staged.
    fn fire(&mut self);

    /// Dispatches the close notice (`None`) to the handlers.
    fn fire_closed(&mut self);
}

/// A receiver plus its handlers, pre-erasure.
pub(crate) struct TypedSource<T> {
    rx: mpsc::Receiver<T>,
    /// One-value hand-off between the wait half and the dispatch half of an
    /// iteration.
    staged: Option<T>,
    inline: Option<InlineHandler<T>>,
    spawned: Option<SpawnHandler<T>>,
}

impl<T: Clone + Send + 'static> TypedSource<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<T>,
        inline: Option<InlineHandler<T>>,
        spawned: Option<SpawnHandler<T>>,
    ) -> Self {
        Self {
            rx,
            staged: None,
            inline,
            spawned,
        }
    }

    fn dispatch(&mut self, value: Option<T>) {
        match (&mut self.inline, &mut self.spawned) {
            (Some(inline), Some(spawned)) => {
                inline(value.clone());
                tokio::spawn(spawned(value));
            }
            (Some(inline), None) => inline(value),
            (None, Some(spawned)) => {
                tokio::spawn(spawned(value));
            }
            (None, None) => {}
        }
    }
}

impl<T: Clone + Send + 'static> Source for TypedSource<T> {
    fn poll_arrival(&mut self, cx: &mut Context<'_>) -> Poll<Arrival> {
        debug_assert!(self.staged.is_none(), "staged value was never fired");
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(value)) => {
                self.staged = Some(value);
                Poll::Ready(Arrival::Value)
            }
            Poll::Ready(None) => Poll::Ready(Arrival::Closed),
            Poll::Pending => Poll::Pending,
        }
    }

    fn fire(&mut self) {
        if let Some(value) = self.staged.take() {
            self.dispatch(Some(value));
        }
    }

    fn fire_closed(&mut self) {
        self.dispatch(None);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Poll;

    use super::*;

    fn poll_once(source: &mut dyn Source) -> Poll<Arrival> {
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        source.poll_arrival(&mut cx)
    }

    #[tokio::test]
    async fn test_value_is_staged_then_fired_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let (tx, rx) = mpsc::channel::<u32>(4);
        let mut source = TypedSource::new(
            rx,
            Some(Box::new(move |v| {
                assert_eq!(v, Some(9u32), "inline handler should see the staged value");
                seen.fetch_add(1, Ordering::SeqCst);
            }) as InlineHandler<u32>),
            None,
        );

        tx.send(9).await.unwrap();
        assert_eq!(poll_once(&mut source), Poll::Ready(Arrival::Value));
        source.fire();
        source.fire();
        assert_eq!(hits.load(Ordering::SeqCst), 1, "second fire must be a no-op");
    }

    #[tokio::test]
    async fn test_closed_reports_after_drain() {
        let (tx, rx) = mpsc::channel::<u32>(4);
        let mut source = TypedSource::new(rx, None, None);

        tx.send(1).await.unwrap();
        drop(tx);
        assert_eq!(poll_once(&mut source), Poll::Ready(Arrival::Value));
        source.fire();
        assert_eq!(
            poll_once(&mut source),
            Poll::Ready(Arrival::Closed),
            "close surfaces only after buffered values drain"
        );
    }
}
