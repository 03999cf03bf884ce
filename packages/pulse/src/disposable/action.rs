//! A handle that runs a teardown action exactly once.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::Disposable;

/// A cancellation handle wrapping a teardown action.
///
/// The action runs exactly once, on whichever thread wins the first
/// [`dispose`][Disposable::dispose] call; every other call, concurrent or
/// later, is a no-op.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use pulse::{ActionDisposable, Disposable};
///
/// let calls = Arc::new(AtomicU32::new(0));
/// let observed = Arc::clone(&calls);
///
/// let handle = ActionDisposable::new(move || {
///     observed.fetch_add(1, Ordering::Relaxed);
/// });
///
/// handle.dispose();
/// handle.dispose();
///
/// assert!(handle.is_disposed());
/// assert_eq!(calls.load(Ordering::Relaxed), 1);
/// ```
pub struct ActionDisposable<F>
where
    F: Fn() + Send + Sync,
{
    disposed: AtomicBool,
    action: F,
}

impl<F> ActionDisposable<F>
where
    F: Fn() + Send + Sync,
{
    /// Creates a handle that will run `action` on first disposal.
    #[must_use]
    pub fn new(action: F) -> Self {
        Self {
            disposed: AtomicBool::new(false),
            action,
        }
    }
}

impl<F> Disposable for ActionDisposable<F>
where
    F: Fn() + Send + Sync,
{
    fn dispose(&self) {
        // The swap is the exactly-once gate: only the first caller sees false.
        if !self.disposed.swap(true, Ordering::AcqRel) {
            (self.action)();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<F> std::fmt::Debug for ActionDisposable<F>
where
    F: Fn() + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDisposable")
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    use static_assertions::assert_impl_all;
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(ActionDisposable<fn()>: Send, Sync);

    #[test]
    fn action_runs_on_first_dispose_only() {
        let calls = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&calls);

        let handle = ActionDisposable::new(move || {
            observed.fetch_add(1, Ordering::Relaxed);
        });

        assert!(!handle.is_disposed());

        for _ in 0..1000 {
            handle.dispose();
        }

        assert!(handle.is_disposed());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn concurrent_disposal_runs_action_exactly_once() {
        with_watchdog(|| {
            let calls = Arc::new(AtomicU32::new(0));
            let observed = Arc::clone(&calls);

            let handle = Arc::new(ActionDisposable::new(move || {
                observed.fetch_add(1, Ordering::Relaxed);
            }));

            let threads: Vec<_> = (0..16)
                .map(|_| {
                    let handle = Arc::clone(&handle);
                    thread::spawn(move || {
                        for _ in 0..64 {
                            handle.dispose();
                        }
                    })
                })
                .collect();

            for thread in threads {
                thread.join().unwrap();
            }

            assert_eq!(calls.load(Ordering::Relaxed), 1);
        });
    }

    #[test]
    fn is_disposed_is_monotonic() {
        let handle = ActionDisposable::new(|| {});
        assert!(!handle.is_disposed());
        handle.dispose();
        assert!(handle.is_disposed());
        handle.dispose();
        assert!(handle.is_disposed());
    }
}
