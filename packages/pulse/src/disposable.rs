//! Cancellation handles and their compositions.
//!
//! Every subscription in this crate is represented by a handle implementing
//! [`Disposable`]: an idempotent, thread-safe cancel capability with a
//! monotonic disposed flag. Operators keep the cancellation graph of a
//! pipeline consistent by composing the handle types in this module:
//!
//! - [`ActionDisposable`] - runs a teardown action exactly once.
//! - [`CompositeDisposable`] - owns a set of handles torn down together.
//! - [`SerialDisposable`] - owns at most one current handle, replacing it as
//!   the pipeline moves through stages.
//! - [`DisposableWrapper`] - a handle that can be given out before the
//!   pipeline backing it exists.
//!
//! All state transitions are compare-and-swap retry loops over an
//! [`AtomicCell`][pulse_utils::AtomicCell]; no handle operation ever blocks,
//! so a disposing thread can never deadlock against an emitting thread.

use std::sync::Arc;

mod action;
mod composite;
mod serial;
mod wrapper;

pub use action::*;
pub use composite::*;
pub use serial::*;
pub use wrapper::*;

/// An idempotent, thread-safe cancellation capability.
///
/// `dispose` may be called from any thread, any number of times, concurrently;
/// the owned teardown runs exactly once. `is_disposed` is monotonic: once it
/// returns `true` it never returns `false` again.
pub trait Disposable: Send + Sync {
    /// Cancels whatever this handle stands for. Safe to call repeatedly and
    /// concurrently; only the first call has an effect.
    fn dispose(&self);

    /// Returns whether this handle has been disposed.
    fn is_disposed(&self) -> bool;
}

/// A shared cancellation handle, as passed through `on_subscribe` and stored
/// in handle compositions.
pub type DisposableRef = Arc<dyn Disposable>;
