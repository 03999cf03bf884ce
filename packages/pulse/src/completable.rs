//! The value-less cardinality.

use std::sync::Arc;

use crate::emitter::EmitterCore;
use crate::{DisposableRef, DisposableWrapper, DynError, report_uncaught_error};

mod do_on_after;
mod observe_on;

/// Observer of a value-less source.
///
/// A well-behaved source calls `on_subscribe` exactly once, before anything
/// else, then at most one of `on_complete` or `on_error`.
pub trait CompletableObserver: Send + Sync {
    /// Delivers the subscription's cancellation handle, before any other
    /// callback.
    fn on_subscribe(&self, handle: DisposableRef);

    /// Signals successful completion. Terminal.
    fn on_complete(&self);

    /// Signals failure. Terminal.
    fn on_error(&self, error: DynError);
}

/// A push-based source that either completes or fails, carrying no value.
///
/// Sources are passive descriptions: nothing happens until a consumer
/// subscribes, and every subscription runs the producing logic anew. Cloning
/// is cheap and clones share the same producing logic.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// use pulse::{Completable, CompletableCallbacks};
///
/// let source = Completable::new(|emitter| {
///     emitter.on_complete();
///     Ok(())
/// });
///
/// let completed = Arc::new(AtomicBool::new(false));
/// let observed = Arc::clone(&completed);
///
/// let subscription = source.subscribe(
///     CompletableCallbacks::new().on_complete(move || observed.store(true, Ordering::Relaxed)),
/// );
///
/// assert!(completed.load(Ordering::Relaxed));
/// drop(subscription);
/// ```
pub struct Completable {
    produce: Arc<dyn Fn(Arc<dyn CompletableObserver>) + Send + Sync>,
}

impl Clone for Completable {
    fn clone(&self) -> Self {
        Self {
            produce: Arc::clone(&self.produce),
        }
    }
}

impl std::fmt::Debug for Completable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completable").finish_non_exhaustive()
    }
}

impl Completable {
    /// Creates a source from a raw producing function, which is fully
    /// responsible for the subscription contract. Intended for operator
    /// implementations; prefer [`new`][Self::new].
    pub fn new_unsafe<F>(produce: F) -> Self
    where
        F: Fn(Arc<dyn CompletableObserver>) + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(produce),
        }
    }

    /// Creates a source driven imperatively through a
    /// [`CompletableEmitter`]. A `produce` error becomes the terminal error,
    /// unless a terminal signal already escaped.
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn(&CompletableEmitter) -> Result<(), DynError> + Send + Sync + 'static,
    {
        Self::new_unsafe(move |observer| {
            let emitter = CompletableEmitter::new(observer);
            if let Err(error) = produce(&emitter) {
                emitter.on_error(error);
            }
        })
    }

    /// Subscribes an observer. Raw contract: the observer sees exactly the
    /// events the producing function emits.
    pub fn subscribe_observer(&self, observer: Arc<dyn CompletableObserver>) {
        (self.produce)(observer);
    }

    /// Subscribes a set of optional callbacks, returning the subscription
    /// handle. An error arriving with no `on_error` callback installed goes
    /// to the uncaught-error sink.
    #[must_use = "dropping the handle does not cancel; call dispose() on it to cancel"]
    pub fn subscribe(&self, callbacks: CompletableCallbacks) -> DisposableRef {
        let wrapper = Arc::new(DisposableWrapper::new());

        if let Some(on_subscribe) = &callbacks.on_subscribe {
            on_subscribe(Arc::clone(&wrapper) as DisposableRef);
        }

        self.subscribe_observer(Arc::new(CallbackObserver {
            wrapper: Arc::clone(&wrapper),
            callbacks,
        }));

        wrapper
    }
}

/// Optional callback set for [`Completable::subscribe`].
pub struct CompletableCallbacks {
    on_subscribe: Option<Box<dyn Fn(DisposableRef) + Send + Sync>>,
    on_complete: Option<Box<dyn Fn() + Send + Sync>>,
    on_error: Option<Box<dyn Fn(DynError) + Send + Sync>>,
}

impl CompletableCallbacks {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_subscribe: None,
            on_complete: None,
            on_error: None,
        }
    }

    /// Called with the subscription handle before the source starts
    /// producing.
    #[must_use]
    pub fn on_subscribe<F>(mut self, f: F) -> Self
    where
        F: Fn(DisposableRef) + Send + Sync + 'static,
    {
        self.on_subscribe = Some(Box::new(f));
        self
    }

    /// Called on successful completion.
    #[must_use]
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called on failure. Without this callback, errors go to the
    /// uncaught-error sink.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(DynError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl Default for CompletableCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompletableCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletableCallbacks").finish_non_exhaustive()
    }
}

struct CallbackObserver {
    wrapper: Arc<DisposableWrapper>,
    callbacks: CompletableCallbacks,
}

impl CompletableObserver for CallbackObserver {
    fn on_subscribe(&self, handle: DisposableRef) {
        self.wrapper.set(handle);
    }

    fn on_complete(&self) {
        if let Some(on_complete) = &self.callbacks.on_complete {
            on_complete();
        }
    }

    fn on_error(&self, error: DynError) {
        match &self.callbacks.on_error {
            Some(on_error) => on_error(error),
            None => report_uncaught_error(&error),
        }
    }
}

/// Producer-side handle for driving one [`Completable`] subscription.
///
/// Only the first terminal signal is delivered; later attempts, racing or
/// not, are silently discarded.
#[derive(Clone)]
pub struct CompletableEmitter {
    core: EmitterCore,
    observer: Arc<dyn CompletableObserver>,
}

impl std::fmt::Debug for CompletableEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletableEmitter")
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl CompletableEmitter {
    fn new(observer: Arc<dyn CompletableObserver>) -> Self {
        let core = EmitterCore::new();
        observer.on_subscribe(core.handle());
        Self { core, observer }
    }

    /// Delivers completion if no terminal signal has been delivered yet.
    pub fn on_complete(&self) {
        self.core.terminal(|| self.observer.on_complete());
    }

    /// Delivers failure if no terminal signal has been delivered yet.
    pub fn on_error(&self, error: DynError) {
        self.core.terminal(move || self.observer.on_error(error));
    }

    /// Parks `disposable` as the subscription's currently active upstream
    /// resource, disposing whatever was parked before - or disposing
    /// `disposable` itself if the subscription is already over.
    pub fn set_disposable(&self, disposable: DisposableRef) {
        self.core.set_disposable(disposable);
    }

    /// Returns whether the subscription has terminated or been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::test_util::{Recording, test_error};

    assert_impl_all!(Completable: Send, Sync);
    assert_impl_all!(CompletableEmitter: Send, Sync);

    #[test]
    fn completion_is_terminal() {
        let recording = Recording::<()>::new();

        let source = Completable::new(|emitter| {
            emitter.on_complete();
            emitter.on_error(test_error("late"));
            Ok(())
        });

        source.subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        assert!(recording.is_completed());
        assert_eq!(recording.error_count(), 0);
    }

    #[test]
    fn error_is_terminal() {
        let recording = Recording::<()>::new();

        let source = Completable::new(|emitter| {
            emitter.on_error(test_error("failed"));
            emitter.on_complete();
            Ok(())
        });

        source.subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        assert!(!recording.is_completed());
        assert_eq!(recording.error_messages(), vec!["failed"]);
    }

    #[test]
    fn setup_error_becomes_the_terminal_error() {
        let recording = Recording::<()>::new();

        let source = Completable::new(|_| Err(test_error("setup failed")));
        source.subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        assert_eq!(recording.error_messages(), vec!["setup failed"]);
    }
}
