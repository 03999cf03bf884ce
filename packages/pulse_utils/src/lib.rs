//! Lock-free shared-memory building blocks for the Pulse reactive packages.
//!
//! This crate provides the two primitives everything else in Pulse is built from:
//!
//! - [`AtomicCell<T>`] - a single mutable slot holding an optional shared value,
//!   with atomic load, store, swap and pointer-identity compare-and-swap. All
//!   cancellation-handle state machines in the `pulse` package are expressed as
//!   compare-and-swap retry loops over this cell.
//! - [`Serializer<T>`] - an order-preserving event linearizer that accepts values
//!   from any thread and replays them to a single callback, one at a time, in
//!   acceptance order, without ever re-entering the callback while it is already
//!   running on the accepting thread's stack.
//!
//! Neither primitive ever blocks a calling thread.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pulse_utils::AtomicCell;
//!
//! let cell = AtomicCell::new("first");
//! let current = cell.load();
//!
//! // The exchange succeeds because nobody replaced the value in between.
//! assert!(cell.compare_and_swap(&current, Arc::new("second")));
//! assert_eq!(*cell.load(), "second");
//! ```

mod atomic_cell;
mod serializer;

pub use atomic_cell::*;
pub use serializer::*;
