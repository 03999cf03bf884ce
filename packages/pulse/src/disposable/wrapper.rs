//! A handle handed out before the pipeline backing it exists.

use crate::{Disposable, DisposableRef, SerialDisposable};

/// A cancellation handle that can be returned to a caller before the
/// producing pipeline has started.
///
/// The wrapper is created empty and handed to external code, which may query
/// or dispose it at any point; the real handle is attached later, when the
/// upstream delivers it through `on_subscribe`. If the wrapper was disposed
/// in the meantime, the attached handle is disposed immediately, so a
/// cancellation that raced subscription setup still takes effect.
///
/// At most one real handle is ever attached to a wrapper.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use pulse::{ActionDisposable, Disposable, DisposableRef, DisposableWrapper};
///
/// let wrapper = DisposableWrapper::new();
///
/// // The caller cancels before the pipeline produced its handle.
/// wrapper.dispose();
///
/// let real: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
/// wrapper.set(Arc::clone(&real));
///
/// // The late-attached handle was cancelled on arrival.
/// assert!(real.is_disposed());
/// ```
#[derive(Debug, Default)]
pub struct DisposableWrapper {
    inner: SerialDisposable,
}

impl DisposableWrapper {
    /// Creates a wrapper with no underlying handle yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: SerialDisposable::new(),
        }
    }

    /// Attaches the real underlying handle.
    ///
    /// If the wrapper has already been disposed, `disposable` is disposed
    /// immediately. Callers attach at most one handle per wrapper.
    pub fn set(&self, disposable: DisposableRef) {
        self.inner.set(disposable);
    }
}

impl Disposable for DisposableWrapper {
    fn dispose(&self) {
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}
