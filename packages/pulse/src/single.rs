//! The single-value cardinality.

use std::sync::Arc;

use crate::emitter::EmitterCore;
use crate::{DisposableRef, DisposableWrapper, DynError, report_uncaught_error};

mod observe_on;
mod repeat_until;

/// Observer of a single-value source.
///
/// A well-behaved source calls `on_subscribe` exactly once, before anything
/// else, then at most one of `on_success` or `on_error`.
pub trait SingleObserver<T>: Send + Sync {
    /// Delivers the subscription's cancellation handle, before any other
    /// callback.
    fn on_subscribe(&self, handle: DisposableRef);

    /// Delivers the value. Terminal.
    fn on_success(&self, value: T);

    /// Signals failure. Terminal.
    fn on_error(&self, error: DynError);
}

/// A push-based source of exactly one value or one error.
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
/// use pulse::{Single, SingleCallbacks};
///
/// let source = Single::new(|emitter| {
///     emitter.on_success(42);
///     Ok(())
/// });
///
/// let seen = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&seen);
///
/// let subscription =
///     source.subscribe(SingleCallbacks::new().on_success(move |value: i32| {
///         *sink.lock().unwrap() = Some(value);
///     }));
///
/// assert_eq!(*seen.lock().unwrap(), Some(42));
/// drop(subscription);
/// ```
pub struct Single<T> {
    produce: Arc<dyn Fn(Arc<dyn SingleObserver<T>>) + Send + Sync>,
}

impl<T> Clone for Single<T> {
    fn clone(&self) -> Self {
        Self {
            produce: Arc::clone(&self.produce),
        }
    }
}

impl<T> std::fmt::Debug for Single<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Single").finish_non_exhaustive()
    }
}

impl<T> Single<T>
where
    T: Send + 'static,
{
    /// Creates a source from a raw producing function, which is fully
    /// responsible for the subscription contract. Intended for operator
    /// implementations; prefer [`new`][Self::new].
    pub fn new_unsafe<F>(produce: F) -> Self
    where
        F: Fn(Arc<dyn SingleObserver<T>>) + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(produce),
        }
    }

    /// Creates a source driven imperatively through a [`SingleEmitter`]. A
    /// `produce` error becomes the terminal error, unless a terminal signal
    /// already escaped.
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn(&SingleEmitter<T>) -> Result<(), DynError> + Send + Sync + 'static,
    {
        Self::new_unsafe(move |observer| {
            let emitter = SingleEmitter::new(observer);
            if let Err(error) = produce(&emitter) {
                emitter.on_error(error);
            }
        })
    }

    /// Subscribes an observer. Raw contract: the observer sees exactly the
    /// events the producing function emits.
    pub fn subscribe_observer(&self, observer: Arc<dyn SingleObserver<T>>) {
        (self.produce)(observer);
    }

    /// Subscribes a set of optional callbacks, returning the subscription
    /// handle. An error arriving with no `on_error` callback installed goes
    /// to the uncaught-error sink.
    #[must_use = "dropping the handle does not cancel; call dispose() on it to cancel"]
    pub fn subscribe(&self, callbacks: SingleCallbacks<T>) -> DisposableRef {
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

/// Optional callback set for [`Single::subscribe`].
pub struct SingleCallbacks<T> {
    on_subscribe: Option<Box<dyn Fn(DisposableRef) + Send + Sync>>,
    on_success: Option<Box<dyn Fn(T) + Send + Sync>>,
    on_error: Option<Box<dyn Fn(DynError) + Send + Sync>>,
}

impl<T> SingleCallbacks<T> {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_subscribe: None,
            on_success: None,
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

    /// Called with the value.
    #[must_use]
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on_success = Some(Box::new(f));
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

impl<T> Default for SingleCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SingleCallbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleCallbacks").finish_non_exhaustive()
    }
}

struct CallbackObserver<T> {
    wrapper: Arc<DisposableWrapper>,
    callbacks: SingleCallbacks<T>,
}

impl<T> SingleObserver<T> for CallbackObserver<T>
where
    T: Send,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.wrapper.set(handle);
    }

    fn on_success(&self, value: T) {
        if let Some(on_success) = &self.callbacks.on_success {
            on_success(value);
        }
    }

    fn on_error(&self, error: DynError) {
        match &self.callbacks.on_error {
            Some(on_error) => on_error(error),
            None => report_uncaught_error(&error),
        }
    }
}

/// Producer-side handle for driving one [`Single`] subscription.
///
/// Only the first terminal signal is delivered; later attempts, racing or
/// not, are silently discarded.
pub struct SingleEmitter<T> {
    core: EmitterCore,
    observer: Arc<dyn SingleObserver<T>>,
}

impl<T> Clone for SingleEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            observer: Arc::clone(&self.observer),
        }
    }
}

impl<T> std::fmt::Debug for SingleEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleEmitter")
            .field("is_disposed", &self.core.is_disposed())
            .finish_non_exhaustive()
    }
}

impl<T> SingleEmitter<T>
where
    T: Send + 'static,
{
    fn new(observer: Arc<dyn SingleObserver<T>>) -> Self {
        let core = EmitterCore::new();
        observer.on_subscribe(core.handle());
        Self { core, observer }
    }

    /// Delivers the value if no terminal signal has been delivered yet.
    pub fn on_success(&self, value: T) {
        self.core.terminal(move || self.observer.on_success(value));
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
