//! A fallible hook running before a delivered value.

use std::sync::Arc;

use crate::{DisposableRef, DynError, Maybe, MaybeEmitter, MaybeObserver};

impl<T> Maybe<T>
where
    T: Send + 'static,
{
    /// Runs `action` with the value before the value is delivered
    /// downstream.
    ///
    /// An `action` error terminates the subscription with that error instead
    /// of the value. Empty completion and upstream errors are forwarded
    /// untouched, without running the action.
    #[must_use]
    pub fn do_on_before_success<A>(&self, action: A) -> Self
    where
        A: Fn(&T) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(BeforeSuccessObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }
}

struct BeforeSuccessObserver<T, A> {
    emitter: MaybeEmitter<T>,
    action: Arc<A>,
}

impl<T, A> MaybeObserver<T> for BeforeSuccessObserver<T, A>
where
    T: Send + 'static,
    A: Fn(&T) -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_success(&self, value: T) {
        if self.emitter.is_disposed() {
            return;
        }

        match (self.action)(&value) {
            Ok(()) => self.emitter.on_success(value),
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
