//! Executor-hop delivery for value-less sources.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    Completable, CompletableEmitter, CompletableObserver, CompositeDisposable, DisposableRef,
    DynError, Executor, Scheduler,
};

impl Completable {
    /// Delivers this source's terminal signal through an executor obtained
    /// from `scheduler`.
    ///
    /// Subscription itself stays synchronous; only `on_complete` and
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

struct ObserveOnObserver {
    disposables: Arc<CompositeDisposable>,
    executor: Arc<dyn Executor>,
    emitter: CompletableEmitter,
}

impl CompletableObserver for ObserveOnObserver {
    fn on_subscribe(&self, handle: DisposableRef) {
        self.disposables.add(handle);
    }

    fn on_complete(&self) {
        let emitter = self.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_complete()));
    }

    fn on_error(&self, error: DynError) {
        let emitter = self.emitter.clone();
        self.executor
            .submit(Duration::ZERO, Box::new(move || emitter.on_error(error)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use testing::with_watchdog;

    use super::*;
    use crate::test_util::{ManualScheduler, Recording, TestCompletable, test_error};
    use crate::{CompletableCallbacks, Disposable};

    #[test]
    fn does_not_complete_synchronously() {
        let upstream = TestCompletable::new();
        let scheduler = ManualScheduler::new();
        let recording = Recording::<()>::new();

        upstream
            .source()
            .observe_on(scheduler)
            .subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        upstream.on_complete();

        assert!(!recording.is_completed());
    }

    #[test]
    fn completes_through_the_executor() {
        let upstream = TestCompletable::new();
        let scheduler = ManualScheduler::new();
        let recording = Recording::<()>::new();

        upstream
            .source()
            .observe_on(scheduler.clone())
            .subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        upstream.on_complete();
        scheduler.process();

        assert!(recording.is_completed());
    }

    #[test]
    fn errors_through_the_executor() {
        let upstream = TestCompletable::new();
        let scheduler = ManualScheduler::new();
        let recording = Recording::<()>::new();

        upstream
            .source()
            .observe_on(scheduler.clone())
            .subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        upstream.on_error(test_error("failed"));
        assert_eq!(recording.error_count(), 0);

        scheduler.process();
        assert_eq!(recording.error_messages(), vec!["failed"]);
    }

    #[test]
    fn disposal_before_the_executor_runs_suppresses_completion() {
        let upstream = TestCompletable::new();
        let scheduler = ManualScheduler::new();
        let recording = Recording::<()>::new();

        upstream
            .source()
            .observe_on(scheduler.clone())
            .subscribe_observer(Arc::clone(&recording) as Arc<dyn CompletableObserver>);

        upstream.on_complete();
        recording.handle().dispose();
        scheduler.process();

        assert!(!recording.is_completed());
        assert!(scheduler.executors().iter().all(|e| e.is_disposed()));
    }

    #[test]
    fn completion_produced_on_another_thread_is_observed_after_processing() {
        with_watchdog(|| {
            let upstream = TestCompletable::new();
            let scheduler = ManualScheduler::new();
            let order = Arc::new(Mutex::new(Vec::new()));

            let sink = Arc::clone(&order);
            let subscription = upstream.source().observe_on(scheduler.clone()).subscribe(
                CompletableCallbacks::new().on_complete(move || {
                    sink.lock().unwrap().push("complete");
                }),
            );

            let emitting = {
                let upstream = Arc::clone(&upstream);
                thread::spawn(move || upstream.on_complete())
            };
            emitting.join().unwrap();

            order.lock().unwrap().push("processing");
            scheduler.process();

            assert_eq!(*order.lock().unwrap(), vec!["processing", "complete"]);
            drop(subscription);
        });
    }
}
