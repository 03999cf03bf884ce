//! A single atomic slot for reference-typed state.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// A single mutable slot holding one shared value, updated atomically.
///
/// The cell always holds exactly one `Arc<T>`. Writes are visible to all
/// threads immediately and [`compare_and_swap`][Self::compare_and_swap]
/// succeeds only when the current occupant is pointer-identical to the
/// expected one, which is what makes the cell usable as the substrate for
/// lock-free state machines: every competing transition is expressed as a
/// retry loop that loads the current state, computes a successor and attempts
/// to install it, with exactly one competitor winning each step.
///
/// Absence and terminal states are expressed in `T` itself (an `Option` or an
/// enum variant), not by emptying the cell.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use pulse_utils::AtomicCell;
///
/// let cell = AtomicCell::new(5_u32);
/// assert_eq!(*cell.load(), 5);
///
/// let current = cell.load();
/// assert!(cell.compare_and_swap(&current, Arc::new(6)));
/// assert_eq!(*cell.load(), 6);
///
/// // `current` is now stale, so a second exchange from it loses.
/// assert!(!cell.compare_and_swap(&current, Arc::new(7)));
/// assert_eq!(*cell.load(), 6);
/// ```
#[derive(Debug)]
pub struct AtomicCell<T> {
    slot: ArcSwap<T>,
}

impl<T> AtomicCell<T> {
    /// Creates a cell occupied by `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: ArcSwap::from_pointee(value),
        }
    }

    /// Creates a cell occupied by an already-shared value.
    #[must_use]
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            slot: ArcSwap::new(value),
        }
    }

    /// Returns the current occupant.
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        self.slot.load_full()
    }

    /// Replaces the occupant unconditionally.
    pub fn store(&self, value: Arc<T>) {
        self.slot.store(value);
    }

    /// Replaces the occupant unconditionally, returning the previous one.
    pub fn swap(&self, value: Arc<T>) -> Arc<T> {
        self.slot.swap(value)
    }

    /// Installs `new` if the current occupant is pointer-identical to
    /// `expected`, returning whether the exchange took place.
    ///
    /// On failure the cell is left untouched; callers running a retry loop
    /// reload the cell and decide again.
    pub fn compare_and_swap(&self, expected: &Arc<T>, new: Arc<T>) -> bool {
        let previous = self.slot.compare_and_swap(expected, new);
        Arc::ptr_eq(&*previous, expected)
    }
}

impl<T> Default for AtomicCell<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
