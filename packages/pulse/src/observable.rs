//! The multi-value stream cardinality.

use std::sync::Arc;

use crate::emitter::EmitterCore;
use crate::{DisposableRef, DisposableWrapper, DynError, report_uncaught_error};

mod do_on_before_dispose;
mod do_on_before_next;
mod sample;

/// Observer of a multi-value stream.
///
/// A well-behaved source calls `on_subscribe` exactly once, before anything
/// else, then zero or more `on_next` calls, then at most one of `on_complete`
/// or `on_error`. Nothing is called after a terminal signal.
pub trait ObservableObserver<T>: Send + Sync {
    /// Delivers the subscription's cancellation handle, before any other
    /// callback.
    fn on_subscribe(&self, handle: DisposableRef);

    /// Delivers the next element.
    fn on_next(&self, value: T);

    /// Signals successful completion. Terminal.
    fn on_complete(&self);

    /// Signals failure. Terminal.
    fn on_error(&self, error: DynError);
}

/// A push-based source of zero or more elements followed by one terminal
/// signal.
///
/// Sources are passive descriptions: nothing happens until a consumer
/// subscribes, and every subscription runs the producing logic anew. Cloning
/// is cheap and clones share the same producing logic.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use pulse::{Observable, ObservableCallbacks};
///
/// let source = Observable::new(|emitter| {
///     emitter.on_next(1);
///     emitter.on_next(2);
///     emitter.on_complete();
///     Ok(())
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let subscription = source.subscribe(
///     ObservableCallbacks::new().on_next(move |value: i32| sink.lock().unwrap().push(value)),
/// );
///
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// drop(subscription);
/// ```
pub struct Observable<T> {
    produce: Arc<dyn Fn(Arc<dyn ObservableObserver<T>>) + Send + Sync>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            produce: Arc::clone(&self.produce),
        }
    }
}

impl<T> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T> Observable<T>
where
    T: Send + 'static,
{
    /// Creates a source from a raw producing function.
    ///
    /// `produce` receives the observer directly and is fully responsible for
    /// the subscription contract: `on_subscribe` first, at most one terminal
    /// signal, nothing after it, cancellation honored. Intended for operator
    /// implementations; everyone else should prefer [`new`][Self::new], which
    /// enforces the contract.
    pub fn new_unsafe<F>(produce: F) -> Self
    where
        F: Fn(Arc<dyn ObservableObserver<T>>) + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(produce),
        }
    }

    /// Creates a source driven imperatively through an
    /// [`ObservableEmitter`].
    ///
    /// By the time `produce` runs, the downstream observer has already
    /// received `on_subscribe`. The emitter enforces the at-most-one-terminal
    /// contract and drops signals arriving after termination or disposal. A
    /// `produce` error becomes the terminal error, unless a terminal signal
    /// already escaped.
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn(&ObservableEmitter<T>) -> Result<(), DynError> + Send + Sync + 'static,
    {
        Self::new_unsafe(move |observer| {
            let emitter = ObservableEmitter::new(observer);
            if let Err(error) = produce(&emitter) {
                emitter.on_error(error);
            }
        })
    }

    /// Subscribes an observer. Raw contract: the observer sees exactly the
    /// events the producing function emits.
    pub fn subscribe_observer(&self, observer: Arc<dyn ObservableObserver<T>>) {
        (self.produce)(observer);
    }

    /// Subscribes a set of optional callbacks, returning the subscription
    /// handle.
    ///
    /// The handle is also passed to the `on_subscribe` callback, before the
    /// producing logic starts. An error arriving with no `on_error` callback
    /// installed goes to the uncaught-error sink.
    #[must_use = "dropping the handle does not cancel; call dispose() on it to cancel"]
    pub fn subscribe(&self, callbacks: ObservableCallbacks<T>) -> DisposableRef {
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

/// Optional callback set for [`Observable::subscribe`].
pub struct ObservableCallbacks<T> {
    on_subscribe: Option<Box<dyn Fn(DisposableRef) + Send + Sync>>,
    on_next: Option<Box<dyn Fn(T) + Send + Sync>>,
    on_complete: Option<Box<dyn Fn() + Send + Sync>>,
    on_error: Option<Box<dyn Fn(DynError) + Send + Sync>>,
}

impl<T> ObservableCallbacks<T> {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_subscribe: None,
            on_next: None,
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

    /// Called for each element.
    #[must_use]
    pub fn on_next<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on_next = Some(Box::new(f));
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

impl<T> Default for ObservableCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ObservableCallbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableCallbacks").finish_non_exhaustive()
    }
}

struct CallbackObserver<T> {
    wrapper: Arc<DisposableWrapper>,
    callbacks: ObservableCallbacks<T>,
}

impl<T> ObservableObserver<T> for CallbackObserver<T>
where
    T: Send,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.wrapper.set(handle);
    }

    fn on_next(&self, value: T) {
        if let Some(on_next) = &self.callbacks.on_next {
            on_next(value);
        }
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

/// Producer-side handle for driving one [`Observable`] subscription.
///
/// The emitter enforces the observer contract on the producer's behalf:
/// elements are dropped once the subscription is disposed, and only the
/// first terminal signal is delivered - later terminal attempts, racing
/// or not, are silently discarded.
pub struct ObservableEmitter<T> {
    core: EmitterCore,
    observer: Arc<dyn ObservableObserver<T>>,
}

impl<T> Clone for ObservableEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<T> std::fmt::Debug for ObservableEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableEmitter")
            .field("is_disposed", &self.core.is_disposed())
            .finish_non_exhaustive()
    }
}

impl<T> ObservableEmitter<T>
where
    T: Send + 'static,
{
    fn new(observer: Arc<dyn ObservableObserver<T>>) -> Self {
        let core = EmitterCore::new();
        observer.on_subscribe(core.handle());
        Self { core, observer }
    }

    /// Delivers an element, unless the subscription has terminated or been
    /// disposed.
    pub fn on_next(&self, value: T) {
        if !self.core.is_disposed() {
            self.observer.on_next(value);
        }
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
    /// Producers check this before expensive work.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }
}
