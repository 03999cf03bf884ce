//! Shared emitter machinery composed into every cardinality's emitter.

use std::sync::Arc;

use crate::{Disposable, DisposableRef, SerialDisposable};

/// The handle-graph half of an emitter, shared by all four cardinalities.
///
/// Wraps the [`SerialDisposable`] that represents the subscription: the
/// handle delivered through `on_subscribe`, the slot the producer's own
/// upstream handle is parked in, and the at-most-one-terminal gate.
#[derive(Clone, Debug)]
pub(crate) struct EmitterCore {
    serial: Arc<SerialDisposable>,
}

impl EmitterCore {
    pub(crate) fn new() -> Self {
        Self {
            serial: Arc::new(SerialDisposable::new()),
        }
    }

    /// The subscription handle to pass downstream via `on_subscribe`.
    pub(crate) fn handle(&self) -> DisposableRef {
        Arc::clone(&self.serial) as DisposableRef
    }

    /// Parks `disposable` as the currently active upstream resource,
    /// disposing whatever was parked before. If the subscription is already
    /// disposed the incoming handle is disposed instead.
    pub(crate) fn set_disposable(&self, disposable: DisposableRef) {
        self.serial.set(disposable);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.serial.is_disposed()
    }

    /// The terminal gate: delivers via `deliver` only if this call wins the
    /// one-and-only terminal transition, then tears down the parked upstream
    /// resource. Losing callers (a second terminal signal, or a signal after
    /// disposal) do nothing.
    pub(crate) fn terminal(&self, deliver: impl FnOnce()) -> bool {
        self.serial.dispose_after(deliver)
    }
}
