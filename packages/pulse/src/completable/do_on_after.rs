//! Hooks running after the observer has been notified.
//!
//! Everything here runs the user action *after* the corresponding observer
//! callback - which means a failing action has no channel left to report
//! through and goes to the uncaught-error sink, composed with the error
//! already being reported where one exists.

use std::sync::Arc;

use crate::{
    ActionDisposable, Completable, CompletableObserver, CompositeDisposable, CompositeError,
    Disposable, DisposableRef, DynError, SerialDisposable, report_uncaught_error,
};

impl Completable {
    /// Runs `action` with the downstream's cancellation handle, after the
    /// downstream's `on_subscribe` has been called.
    ///
    /// An `action` error terminates the subscription with that error and the
    /// upstream is never subscribed.
    #[must_use]
    pub fn do_on_after_subscribe<A>(&self, action: A) -> Self
    where
        A: Fn(&DisposableRef) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new_unsafe(move |observer| {
            let serial = Arc::new(SerialDisposable::new());
            let handle = Arc::clone(&serial) as DisposableRef;
            observer.on_subscribe(Arc::clone(&handle));

            if let Err(error) = action(&handle) {
                observer.on_error(error);
                serial.dispose();
                return;
            }

            upstream.subscribe_observer(Arc::new(AfterSubscribeObserver { serial, observer }));
        })
    }

    /// Runs `action` after the downstream observed `on_complete`.
    ///
    /// The channel has already terminated, so an `action` error goes to the
    /// uncaught-error sink.
    #[must_use]
    pub fn do_on_after_complete<A>(&self, action: A) -> Self
    where
        A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(AfterCompleteObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }

    /// Runs `action` with the error after the downstream observed
    /// `on_error`.
    ///
    /// The channel has already terminated, so an `action` error goes to the
    /// uncaught-error sink as a [`CompositeError`] preserving both errors.
    #[must_use]
    pub fn do_on_after_error<A>(&self, action: A) -> Self
    where
        A: Fn(&DynError) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(AfterErrorObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }

    /// Runs `action` after the downstream observed either terminal signal.
    ///
    /// The channel has already terminated, so an `action` error goes to the
    /// uncaught-error sink - composed with the terminal error when the
    /// terminal signal was `on_error`.
    #[must_use]
    pub fn do_on_after_terminate<A>(&self, action: A) -> Self
    where
        A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(AfterTerminateObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }

    /// Runs `action` after a downstream disposal has reached and disposed
    /// the upstream. A subscription that ends with a terminal signal does
    /// not run the action.
    ///
    /// The channel is gone by the time the action runs, so an `action` error
    /// goes to the uncaught-error sink.
    #[must_use]
    pub fn do_on_after_dispose<A>(&self, action: A) -> Self
    where
        A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new_unsafe(move |observer| {
            let disposables = Arc::new(CompositeDisposable::new());
            observer.on_subscribe(Arc::clone(&disposables) as DisposableRef);

            upstream.subscribe_observer(Arc::new(AfterDisposeObserver {
                disposables,
                observer,
                action: Arc::clone(&action),
            }));
        })
    }

    /// Runs `action` exactly once when the subscription ends for any reason:
    /// after a terminal signal reaches the downstream, or after a downstream
    /// disposal reaches the upstream.
    ///
    /// An `action` error goes to the uncaught-error sink, composed with the
    /// terminal error when the subscription ended in `on_error`.
    #[must_use]
    pub fn do_on_after_finally<A>(&self, action: A) -> Self
    where
        A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new_unsafe(move |observer| {
            let disposables = Arc::new(CompositeDisposable::new());
            observer.on_subscribe(Arc::clone(&disposables) as DisposableRef);

            upstream.subscribe_observer(Arc::new(AfterFinallyObserver {
                disposables,
                observer,
                action: Arc::clone(&action),
            }));
        })
    }
}

struct AfterSubscribeObserver {
    serial: Arc<SerialDisposable>,
    observer: Arc<dyn CompletableObserver>,
}

impl CompletableObserver for AfterSubscribeObserver {
    fn on_subscribe(&self, handle: DisposableRef) {
        self.serial.set(handle);
    }

    fn on_complete(&self) {
        self.serial.dispose_after(|| self.observer.on_complete());
    }

    fn on_error(&self, error: DynError) {
        self.serial
            .dispose_after(move || self.observer.on_error(error));
    }
}

struct AfterCompleteObserver<A> {
    emitter: crate::CompletableEmitter,
    action: Arc<A>,
}

impl<A> CompletableObserver for AfterCompleteObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_complete(&self) {
        self.emitter.on_complete();

        if let Err(error) = (self.action)() {
            report_uncaught_error(&error);
        }
    }

    fn on_error(&self, error: DynError) {
        self.emitter.on_error(error);
    }
}

struct AfterErrorObserver<A> {
    emitter: crate::CompletableEmitter,
    action: Arc<A>,
}

impl<A> CompletableObserver for AfterErrorObserver<A>
where
    A: Fn(&DynError) -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_complete(&self) {
        self.emitter.on_complete();
    }

    fn on_error(&self, error: DynError) {
        self.emitter.on_error(Arc::clone(&error));

        if let Err(secondary) = (self.action)(&error) {
            let composed: DynError = Arc::new(CompositeError::new(error, secondary));
            report_uncaught_error(&composed);
        }
    }
}

struct AfterTerminateObserver<A> {
    emitter: crate::CompletableEmitter,
    action: Arc<A>,
}

impl<A> CompletableObserver for AfterTerminateObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_complete(&self) {
        self.emitter.on_complete();

        if let Err(error) = (self.action)() {
            report_uncaught_error(&error);
        }
    }

    fn on_error(&self, error: DynError) {
        self.emitter.on_error(Arc::clone(&error));

        if let Err(secondary) = (self.action)() {
            let composed: DynError = Arc::new(CompositeError::new(error, secondary));
            report_uncaught_error(&composed);
        }
    }
}

struct AfterDisposeObserver<A> {
    disposables: Arc<CompositeDisposable>,
    observer: Arc<dyn CompletableObserver>,
    action: Arc<A>,
}

impl<A> AfterDisposeObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    /// Forwards a terminal signal with the action member detached, so the
    /// closing disposal below cannot trigger it.
    fn finish(&self, forward: impl FnOnce()) {
        self.disposables.clear(false);
        forward();
        self.disposables.dispose();
    }
}

impl<A> CompletableObserver for AfterDisposeObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);

        // Added after the upstream handle: insertion-order teardown runs the
        // action once the upstream is already disposed.
        let action = Arc::clone(&self.action);
        self.disposables
            .add(Arc::new(ActionDisposable::new(move || {
                if let Err(error) = action() {
                    report_uncaught_error(&error);
                }
            })));
    }

    fn on_complete(&self) {
        self.finish(|| self.observer.on_complete());
    }

    fn on_error(&self, error: DynError) {
        self.finish(move || self.observer.on_error(error));
    }
}

struct AfterFinallyObserver<A> {
    disposables: Arc<CompositeDisposable>,
    observer: Arc<dyn CompletableObserver>,
    action: Arc<A>,
}

impl<A> AfterFinallyObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    fn finish(&self, forward: impl FnOnce()) {
        self.disposables.clear(false);
        forward();
        self.disposables.dispose();
    }
}

impl<A> CompletableObserver for AfterFinallyObserver<A>
where
    A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);

        let action = Arc::clone(&self.action);
        self.disposables
            .add(Arc::new(ActionDisposable::new(move || {
                if let Err(error) = action() {
                    report_uncaught_error(&error);
                }
            })));
    }

    fn on_complete(&self) {
        self.finish(|| self.observer.on_complete());

        if let Err(error) = (self.action)() {
            report_uncaught_error(&error);
        }
    }

    fn on_error(&self, error: DynError) {
        self.finish(move || {
            self.observer.on_error(Arc::clone(&error));

            if let Err(secondary) = (self.action)() {
                let composed: DynError = Arc::new(CompositeError::new(error, secondary));
                report_uncaught_error(&composed);
            }
        });
    }
}
