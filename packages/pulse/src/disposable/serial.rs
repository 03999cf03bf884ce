//! A handle owning at most one replaceable member.

use std::sync::Arc;

use pulse_utils::AtomicCell;

use crate::{Disposable, DisposableRef};

enum State {
    Active(Option<DisposableRef>),
    Disposed,
}

/// A cancellation handle owning zero or one current member handle.
///
/// Installing a new member disposes the previous one (or hands it back via
/// [`replace`][Self::replace]). Disposing the serial handle disposes the
/// current member and poisons the handle: every later installation disposes
/// the incoming handle immediately instead of storing it, so a cancelled
/// pipeline can never re-acquire resources.
///
/// This is the handle every emitter wraps: as a subscription moves through
/// pipeline stages, the "currently active upstream" member is swapped in and
/// out while downstream code keeps holding the same serial handle.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use pulse::{ActionDisposable, Disposable, DisposableRef, SerialDisposable};
///
/// let serial = SerialDisposable::new();
///
/// let first: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
/// serial.set(Arc::clone(&first));
///
/// // Installing a replacement disposes the previous member.
/// serial.set(Arc::new(ActionDisposable::new(|| {})));
/// assert!(first.is_disposed());
///
/// serial.dispose();
///
/// // The handle is poisoned: late arrivals are disposed on the spot.
/// let late: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
/// serial.set(Arc::clone(&late));
/// assert!(late.is_disposed());
/// ```
pub struct SerialDisposable {
    state: AtomicCell<State>,
}

impl SerialDisposable {
    /// Creates an active handle with no member.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicCell::new(State::Active(None)),
        }
    }

    /// Installs `disposable` as the current member, disposing the previous
    /// member if there was one.
    ///
    /// If this handle is already disposed, `disposable` is disposed
    /// immediately and never stored.
    pub fn set(&self, disposable: DisposableRef) {
        if let Some(previous) = self.install(disposable) {
            previous.dispose();
        }
    }

    /// Installs `disposable` as the current member and returns the previous
    /// member without disposing it.
    ///
    /// If this handle is already disposed, `disposable` is disposed
    /// immediately and `None` is returned.
    pub fn replace(&self, disposable: DisposableRef) -> Option<DisposableRef> {
        self.install(disposable)
    }

    /// Atomically marks this handle disposed and detaches the current member,
    /// returning it *without* disposing it - ownership transfers to the
    /// caller.
    ///
    /// Returns `None` if the handle was already disposed or held no member.
    pub fn clear_and_dispose(&self) -> Option<DisposableRef> {
        self.enter_disposed().flatten()
    }

    /// Runs `deliver` if and only if this call wins the active-to-disposed
    /// transition, then disposes the detached member.
    ///
    /// This is the at-most-once gate behind every terminal signal: concurrent
    /// racers resolve to exactly one winner, the downstream is notified before
    /// the upstream is torn down, and losers do nothing. Returns whether this
    /// call won.
    pub fn dispose_after(&self, deliver: impl FnOnce()) -> bool {
        match self.enter_disposed() {
            Some(member) => {
                deliver();
                if let Some(member) = member {
                    member.dispose();
                }
                true
            }
            None => false,
        }
    }

    fn install(&self, disposable: DisposableRef) -> Option<DisposableRef> {
        let replacement = Arc::new(State::Active(Some(Arc::clone(&disposable))));

        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => {
                    disposable.dispose();
                    return None;
                }
                State::Active(previous) => {
                    let previous = previous.clone();
                    if self
                        .state
                        .compare_and_swap(&current, Arc::clone(&replacement))
                    {
                        return previous;
                    }
                }
            }
        }
    }

    /// Attempts the active-to-disposed transition. Returns the detached member
    /// slot if this call performed the transition, `None` if another caller
    /// already had.
    fn enter_disposed(&self) -> Option<Option<DisposableRef>> {
        let disposed = Arc::new(State::Disposed);

        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => return None,
                State::Active(member) => {
                    let member = member.clone();
                    if self.state.compare_and_swap(&current, Arc::clone(&disposed)) {
                        return Some(member);
                    }
                }
            }
        }
    }
}

impl Disposable for SerialDisposable {
    fn dispose(&self) {
        if let Some(Some(member)) = self.enter_disposed() {
            member.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        matches!(&*self.state.load(), State::Disposed)
    }
}

impl Default for SerialDisposable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SerialDisposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDisposable")
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
