//! Order-preserving, re-entrancy-safe event linearization.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam::queue::SegQueue;

/// Linearizes values arriving from any thread into strictly ordered,
/// non-overlapping invocations of a single callback.
///
/// [`accept`][Self::accept] enqueues the value and, when no other thread is
/// currently draining, the accepting thread becomes the drain loop: it keeps
/// invoking the callback for every value enqueued up to the point draining
/// completes - including values enqueued *by the callback itself*. A callback
/// that feeds values back in therefore rejoins the already-running loop
/// instead of recursing, which keeps synchronous feedback cycles (such as
/// immediate resubscription to a source) at constant stack depth.
///
/// The callback returns `true` to keep the serializer alive. Returning `false`
/// permanently disables it: queued values are discarded and later accepts are
/// ignored.
///
/// If the callback panics, drain ownership is released before the panic
/// propagates, so a later `accept` can resume draining whatever remains
/// queued.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use pulse_utils::Serializer;
///
/// let remaining = Arc::new(AtomicUsize::new(3));
/// let observed = Arc::clone(&remaining);
///
/// let serializer = Arc::new(Serializer::new(move |_: u32| {
///     observed.fetch_sub(1, Ordering::Relaxed) > 1
/// }));
///
/// serializer.accept(1);
/// serializer.accept(2);
/// serializer.accept(3);
/// serializer.accept(4); // Ignored: the callback returned false on the third value.
///
/// assert_eq!(remaining.load(Ordering::Relaxed), 0);
/// ```
pub struct Serializer<T> {
    queue: SegQueue<T>,

    /// Count of accepted-but-not-yet-drained values. The accepter that moves
    /// this from zero owns the drain loop until it observes zero again.
    pending: AtomicUsize,

    /// Set once the callback asks to stop; never cleared.
    disabled: AtomicBool,

    on_value: Box<dyn Fn(T) -> bool + Send + Sync>,
}

impl<T> std::fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T> Serializer<T>
where
    T: Send,
{
    /// Creates a serializer delivering to `on_value`.
    #[must_use]
    pub fn new<F>(on_value: F) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        Self {
            queue: SegQueue::new(),
            pending: AtomicUsize::new(0),
            disabled: AtomicBool::new(false),
            on_value: Box::new(on_value),
        }
    }

    /// Returns whether the callback has asked the serializer to stop.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Enqueues `value` for delivery in acceptance order.
    ///
    /// If no drain loop is currently running, the calling thread runs it,
    /// delivering this value and any values other threads (or the callback)
    /// enqueue before the loop winds down. Otherwise the call returns
    /// immediately and the owning thread delivers the value.
    pub fn accept(&self, value: T) {
        if self.is_disabled() {
            return;
        }

        self.queue.push(value);

        // The push above is ordered before this increment, so whichever thread
        // owns the drain loop when it observes the increment also observes the
        // queued value.
        if self.pending.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        self.drain();
    }

    #[cfg_attr(test, mutants::skip)] // Ownership handoff; tampering hangs the test suite.
    fn drain(&self) {
        // If the callback panics we must hand back drain ownership before
        // unwinding, otherwise no future accept could ever drain again.
        let ownership = scopeguard::guard((), |()| {
            self.pending.store(0, Ordering::Release);
        });

        loop {
            let value = self
                .queue
                .pop()
                .expect("pending count is ahead of the queue, so a queued value must be visible");

            if !self.is_disabled() && !(self.on_value)(value) {
                self.disabled.store(true, Ordering::Release);
            }

            if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                break;
            }
        }

        // Normal exit: ownership was already released by the final decrement.
        scopeguard::ScopeGuard::into_inner(ownership);
    }
}
