//! A fallible hook running before a delivered error.

use std::sync::Arc;

use crate::{CompositeError, DisposableRef, DynError, Maybe, MaybeEmitter, MaybeObserver};

impl<T> Maybe<T>
where
    T: Send + 'static,
{
    /// Runs `action` with the error before the error is delivered
    /// downstream.
    ///
    /// If the action itself fails, the downstream receives a single
    /// [`CompositeError`] preserving the upstream error and the action's
    /// error. Success and empty completion are forwarded untouched, without
    /// running the action.
    #[must_use]
    pub fn do_on_before_error<A>(&self, action: A) -> Self
    where
        A: Fn(&DynError) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let action = Arc::new(action);

        Self::new(move |emitter| {
            upstream.subscribe_observer(Arc::new(BeforeErrorObserver {
                emitter: emitter.clone(),
                action: Arc::clone(&action),
            }));
            Ok(())
        })
    }
}

struct BeforeErrorObserver<T, A> {
    emitter: MaybeEmitter<T>,
    action: Arc<A>,
}

impl<T, A> MaybeObserver<T> for BeforeErrorObserver<T, A>
where
    T: Send + 'static,
    A: Fn(&DynError) -> Result<(), DynError> + Send + Sync + 'static,
{
    fn on_subscribe(&self, handle: DisposableRef) {
        self.emitter.set_disposable(handle);
    }

    fn on_success(&self, value: T) {
        self.emitter.on_success(value);
    }

    fn on_complete(&self) {
        self.emitter.on_complete();
    }

    fn on_error(&self, error: DynError) {
        match (self.action)(&error) {
            Ok(()) => self.emitter.on_error(error),
            Err(secondary) => self
                .emitter
                .on_error(Arc::new(CompositeError::new(error, secondary))),
        }
    }
}
