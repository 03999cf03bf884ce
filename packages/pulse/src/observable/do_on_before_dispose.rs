//! A fallible hook running before downstream cancellation reaches upstream.

use std::sync::Arc;

use crate::{
    ActionDisposable, CompositeDisposable, Disposable, DisposableRef, DynError, Observable,
    ObservableObserver, report_uncaught_error,
};

impl<T> Observable<T>
where
    T: Send + 'static,
{
    /// Runs `action` when the downstream disposes its subscription handle,
    /// before the disposal reaches the upstream.
    ///
    /// The action runs only for genuine cancellation: a subscription that
    /// ends with a terminal signal detaches the action first. An `action`
    /// error cannot be delivered through the already-cancelled channel and
    /// goes to the uncaught-error sink; the upstream is still disposed.
    #[must_use]
    pub fn do_on_before_dispose<A>(&self, action: A) -> Self
    where
        A: Fn() -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new_unsafe(move |observer| {
            let disposables = Arc::new(CompositeDisposable::new());
            observer.on_subscribe(Arc::clone(&disposables) as DisposableRef);

            // The action member is added before the upstream handle so
            // insertion-order teardown runs it first.
            let action = Arc::clone(&action);
            disposables.add(Arc::new(ActionDisposable::new(move || {
                if let Err(error) = action() {
                    report_uncaught_error(&error);
                }
            })));

            upstream.subscribe_observer(Arc::new(BeforeDisposeObserver {
                disposables,
                observer,
            }));
        })
    }
}

struct BeforeDisposeObserver<T> {
    disposables: Arc<CompositeDisposable>,
    observer: Arc<dyn ObservableObserver<T>>,
}

impl<T> BeforeDisposeObserver<T> {
    /// Forwards a terminal signal with the dispose-action detached, then
    /// closes the composite so late additions cannot leak.
    fn finish(&self, forward: impl FnOnce()) {
        self.disposables.clear(false);
        forward();
        self.disposables.dispose();
    }
}

impl<T> ObservableObserver<T> for BeforeDisposeObserver<T>
where
    T: Send + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);
    }

    fn on_next(&self, value: T) {
        self.observer.on_next(value);
    }

    fn on_complete(&self) {
        self.finish(|| self.observer.on_complete());
    }

    fn on_error(&self, error: DynError) {
        self.finish(move || self.observer.on_error(error));
    }
}
