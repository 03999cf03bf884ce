//! Push-based reactive sources with composable, leak-free cancellation.
//!
//! This crate provides four source cardinalities sharing one subscription
//! contract:
//!
//! - [`Observable<T>`] - zero or more elements, then completion or an error.
//! - [`Single<T>`] - exactly one value or an error.
//! - [`Maybe<T>`] - at most one value: success, empty completion or an error.
//! - [`Completable`] - no value: completion or an error.
//!
//! A consumer subscribes once and receives an ordered sequence of lifecycle
//! events: `on_subscribe` first, carrying a cancellation handle, then data,
//! then at most one terminal signal. Cancellation is threaded through every
//! hop of a pipeline by the [`Disposable`] handle family: disposing the
//! handle returned from `subscribe` tears down the entire upstream chain
//! exactly once, however deep, on whatever threads it spans.
//!
//! Sources are driven imperatively through emitters, which enforce the
//! contract on the producer's behalf:
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use pulse::{Observable, ObservableCallbacks};
//!
//! let source = Observable::new(|emitter| {
//!     for value in 1..=3 {
//!         if emitter.is_disposed() {
//!             break;
//!         }
//!         emitter.on_next(value);
//!     }
//!     emitter.on_complete();
//!     Ok(())
//! });
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//!
//! let subscription = source.subscribe(
//!     ObservableCallbacks::new().on_next(move |value: i32| sink.lock().unwrap().push(value)),
//! );
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
//! drop(subscription);
//! ```
//!
//! # Threading
//!
//! There is no implicit threading: events are delivered on whatever thread
//! the producer emits from. Operators that change execution context consume
//! the [`Scheduler`]/[`Executor`] contract; this crate does not ship a
//! thread-pool or timer backend. All internal coordination is lock-free, so
//! a disposing thread and an emitting thread can never deadlock each other.
//!
//! Within one subscription, events must come from a single logical emission
//! source at a time. An operator that lets multiple threads emit into the
//! same downstream observer restores that contract itself by funneling the
//! signals through a [`Serializer`][pulse_utils::Serializer], which is also
//! what makes synchronous resubscription loops stack-safe.
//!
//! # Errors
//!
//! The error channel carries [`DynError`] values. An error that can no
//! longer be delivered through a live channel - for example, a cleanup
//! action failing after its subscription already terminated - goes to the
//! process-wide uncaught-error sink (see [`set_uncaught_error_handler`]),
//! composed into a [`CompositeError`] when a primary error was already being
//! reported.

mod completable;
mod disposable;
mod emitter;
mod error;
mod maybe;
mod observable;
mod scheduler;
mod single;

#[cfg(test)]
mod test_util;

pub use completable::*;
pub use disposable::*;
pub use error::*;
pub use maybe::*;
pub use observable::*;
pub use scheduler::*;
pub use single::*;
