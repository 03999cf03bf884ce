//! Executor-hop delivery for single-value sources.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    CompositeDisposable, DisposableRef, DynError, Executor, Scheduler, Single, SingleEmitter,
    SingleObserver,
};

impl<T> Single<T>
where
    T: Send + 'static,
{
    /// Delivers this source's terminal signal through an executor obtained
    /// from `scheduler`.
    ///
    /// Subscription itself stays synchronous; only `on_success` and
    /// `on_error` hop. One executor is acquired per subscription and
    /// registered in the subscription's cancellation graph, so disposing the
    /// downstream handle before the executor runs suppresses delivery
    /// entirely.
    #[must_use]
    pub fn observe_on<S>(&self, scheduler: S) -> Self
    where
        S: Scheduler + 'static,
    {
        let upstream = self.clone();

        Self::new(move |emitter| {
            let disposables = Arc::new(CompositeDisposable::new());
            emitter.set_disposable(Arc::clone(&disposables) as DisposableRef);

            let executor = scheduler.new_executor();
            disposables.add(Arc::clone(&executor) as DisposableRef);

            upstream.subscribe_observer(Arc::new(ObserveOnObserver {
                disposables: Arc::clone(&disposables),
                executor,
                emitter: emitter.clone(),
            }));

            Ok(())
        })
    }
}

struct ObserveOnObserver<T> {
    disposables: Arc<CompositeDisposable>,
    executor: Arc<dyn Executor>,
    emitter: SingleEmitter<T>,
}

impl<T> SingleObserver<T> for ObserveOnObserver<T>
where
    T: Send + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);
    }

    fn on_success(&self, value: T) {
        let emitter = self.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_success(value)));
    }

    fn on_error(&self, error: DynError) {
        let emitter = self.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_error(error)));
    }
}
