//! Periodic last-value sampling.

use std::sync::Arc;
use std::time::Duration;

use pulse_utils::AtomicCell;

use crate::{
    CompositeDisposable, DisposableRef, DynError, Executor, Observable, ObservableEmitter,
    ObservableObserver, Scheduler,
};

impl<T> Observable<T>
where
    T: Send + Sync + 'static,
{
    /// Emits the most recent element (if any) the source produced within
    /// each periodic `window`, at the window boundary. A window in which the
    /// source produced nothing emits nothing.
    ///
    /// One executor is acquired per subscription and registered in the
    /// subscription's cancellation graph; sampled elements and the terminal
    /// signal are delivered on that executor.
    #[must_use]
    pub fn sample<S>(&self, window: Duration, scheduler: S) -> Self
    where
        S: Scheduler + 'static,
    {
        let upstream = self.clone();

        Self::new(move |emitter| {
            let disposables = Arc::new(CompositeDisposable::new());
            emitter.set_disposable(Arc::clone(&disposables) as DisposableRef);

            let executor = scheduler.new_executor();
            disposables.add(Arc::clone(&executor) as DisposableRef);

            upstream.subscribe_observer(Arc::new(SampleObserver {
                state: Arc::new(SampleState {
                    last: AtomicCell::new(None),
                    emitter: emitter.clone(),
                }),
                disposables: Arc::clone(&disposables),
                executor,
                window,
            }));

            Ok(())
        })
    }
}

struct SampleState<T> {
    /// The element seen since the last window boundary, if any. Only written
    /// and swapped, never loaded, so the boundary task always holds the sole
    /// reference to what it takes out.
    last: AtomicCell<Option<T>>,
    emitter: ObservableEmitter<T>,
}

struct SampleObserver<T> {
    state: Arc<SampleState<T>>,
    disposables: Arc<CompositeDisposable>,
    executor: Arc<dyn Executor>,
    window: Duration,
}

impl<T> ObservableObserver<T> for SampleObserver<T>
where
    T: Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);

        let state = Arc::clone(&self.state);
        self.executor.submit_periodic(
            self.window,
            self.window,
            Box::new(move || {
                let taken = state.last.swap(Arc::new(None));
                if let Ok(Some(value)) = Arc::try_unwrap(taken) {
                    state.emitter.on_next(value);
                }
            }),
        );
    }

    fn on_next(&self, value: T) {
        self.state.last.store(Arc::new(Some(value)));
    }

    fn on_complete(&self) {
        self.executor.cancel();

        let emitter = self.state.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_complete()));
    }

    fn on_error(&self, error: DynError) {
        self.executor.cancel();

        let emitter = self.state.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_error(error)));
    }
}
