//! Stack-safe repetition of a single-value source into a stream.

use std::sync::{Arc, Weak};

use pulse_utils::Serializer;

use crate::{DisposableRef, DynError, Observable, ObservableEmitter, Single, SingleObserver};

impl<T> Single<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Subscribes to this source repeatedly, emitting every produced value
    /// to the resulting stream, until `predicate` returns `true` for a
    /// value - that value is still emitted, then the stream completes.
    ///
    /// A `predicate` error terminates the stream with that error. An
    /// upstream error is forwarded as-is.
    ///
    /// Resubscription is trampolined: a source that succeeds synchronously
    /// rejoins the in-progress drain loop instead of recursing, so tens of
    /// thousands of repetitions run at constant stack depth.
    #[must_use]
    pub fn repeat_until<P>(&self, predicate: P) -> Observable<T>
    where
        P: Fn(&T) -> Result<bool, DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);

        Observable::new(move |emitter| {
            let observer =
                RepeatUntilObserver::new(upstream.clone(), emitter.clone(), Arc::clone(&predicate));
            observer.resubscribe();
            Ok(())
        })
    }
}

struct RepeatUntilObserver<T, P> {
    emitter: ObservableEmitter<T>,
    predicate: Arc<P>,

    /// Funnels resubscription requests: a request arriving while one is
    /// already being served (synchronous success) queues behind it instead
    /// of growing the stack.
    resubscriber: Serializer<()>,
}

impl<T, P> RepeatUntilObserver<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: Fn(&T) -> Result<bool, DynError> + Send + Sync + 'static,
{
    fn new(upstream: Single<T>, emitter: ObservableEmitter<T>, predicate: Arc<P>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            Self {
                emitter,
                predicate,
                resubscriber: Serializer::new(move |()| {
                    if let Some(observer) = weak.upgrade() {
                        upstream.subscribe_observer(observer as Arc<dyn SingleObserver<T>>);
                    }
                    true
                }),
            }
        })
    }

    fn resubscribe(&self) {
        self.resubscriber.accept(());
    }
}

impl<T, P> SingleObserver<T> for RepeatUntilObserver<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: Fn(&T) -> Result<bool, DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_success(&self, value: T) {
        self.emitter.on_next(value.clone());

        match (self.predicate)(&value) {
            Err(error) => self.emitter.on_error(error),
            Ok(done) => {
                if !self.emitter.is_disposed() {
                    if done {
                        self.emitter.on_complete();
                    } else {
                        self.resubscribe();
                    }
                }
            }
        }
    }

    fn on_error(&self, error: DynError) {
        self.emitter.on_error(error);
    }
}
