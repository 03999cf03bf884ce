//! The execution-context contract consumed by time- and thread-aware
//! operators.
//!
//! This crate does not ship a thread pool or timer. Operators that need one
//! - periodic sampling, executor-hop delivery - consume these traits and
//! leave the backend to the embedding application.

use std::sync::Arc;
use std::time::Duration;

use crate::Disposable;

/// Produces sequential task-execution contexts.
///
/// Operators acquire exactly one [`Executor`] per subscription and register
/// it in that subscription's cancellation graph, so cancelling the
/// subscription tears the executor down with everything else.
pub trait Scheduler: Send + Sync {
    /// Creates a fresh executor.
    fn new_executor(&self) -> Arc<dyn Executor>;
}

/// A sequential task-execution context obtained from a [`Scheduler`].
///
/// Implementations guarantee that tasks submitted to the same executor never
/// run concurrently with each other, and run in submission order when their
/// delays are equal. Tasks cross threads, so everything they capture is
/// `Send`.
///
/// [`cancel`][Self::cancel] drops pending and periodic work while keeping the
/// executor usable for new submissions; disposing the executor stops
/// everything permanently.
pub trait Executor: Disposable {
    /// Runs `task` once, after `delay`.
    fn submit(&self, delay: Duration, task: Box<dyn FnOnce() + Send>);

    /// Runs `task` every `period`, starting after `delay`.
    fn submit_periodic(&self, delay: Duration, period: Duration, task: Box<dyn Fn() + Send + Sync>);

    /// Drops pending and periodic work without disposing the executor.
    fn cancel(&self);
}
