//! A fallible hook running before each downstream element.

use std::sync::Arc;

use crate::{DisposableRef, DynError, Observable, ObservableEmitter, ObservableObserver};

impl<T> Observable<T>
where
    T: Send + 'static,
{
    /// Runs `action` with each element before the element is delivered
    /// downstream.
    ///
    /// An `action` error terminates the subscription with that error: the
    /// element it rejected is not delivered, and later upstream elements are
    /// neither delivered nor re-run through the action.
    #[must_use]
    pub fn do_on_before_next<A>(&self, action: A) -> Self
    where
        A: Fn(&T) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(BeforeNextObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }
}

struct BeforeNextObserver<T, A> {
    emitter: ObservableEmitter<T>,
    action: Arc<A>,
}

impl<T, A> ObservableObserver<T> for BeforeNextObserver<T, A>
where
    T: Send + 'static,
    A: Fn(&T) -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_next(&self, value: T) {
        // A previously failed action has already terminated the channel;
        // stop running the action for elements the upstream keeps pushing.
        if self.emitter.is_disposed() {
            return;
        }

        match (self.action)(&value) {
            Ok(()) => self.emitter.on_next(value),
            Err(error) => self.emitter.on_error(error),
        }
    }

    fn on_complete(&self) {
        self.emitter.on_complete();
    }

    fn on_error(&self, error: DynError) {
        self.emitter.on_error(error);
    }
}
