//! A handle owning a set of members torn down together.

use std::sync::Arc;

use pulse_utils::AtomicCell;

use crate::{Disposable, DisposableRef};

enum State {
    Active(Vec<DisposableRef>),
    Disposed,
}

/// A cancellation handle owning a growable set of member handles.
///
/// Disposing the composite disposes every member, in insertion order, exactly
/// once. Once disposed the composite stays disposed: a handle added afterwards
/// is disposed immediately rather than retained, so late registrations in a
/// cancelled pipeline cannot leak.
///
/// Members can also be detached without touching the composite's own state:
/// [`remove`][Self::remove] drops a single member and
/// [`clear`][Self::clear] drops all of them, optionally disposing what was
/// removed. Operators use `clear(false)` to detach a finalizer member right
/// before triggering it through another path, preventing double invocation.
///
/// Membership is keyed by pointer identity; adding the same handle twice
/// keeps a single entry.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use pulse::{ActionDisposable, CompositeDisposable, Disposable, DisposableRef};
///
/// let composite = CompositeDisposable::new();
///
/// let member: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
/// assert!(composite.add(Arc::clone(&member)));
///
/// composite.dispose();
/// assert!(member.is_disposed());
///
/// // Late additions are disposed before `add` returns.
/// let late: DisposableRef = Arc::new(ActionDisposable::new(|| {}));
/// assert!(!composite.add(Arc::clone(&late)));
/// assert!(late.is_disposed());
/// ```
pub struct CompositeDisposable {
    state: AtomicCell<State>,
}

impl CompositeDisposable {
    /// Creates an active composite with no members.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicCell::new(State::Active(Vec::new())),
        }
    }

    /// Adds a member, returning whether it was retained.
    ///
    /// If the composite is already disposed, `disposable` is disposed before
    /// this method returns and `false` is reported. Adding a handle that is
    /// already a member leaves the set unchanged.
    pub fn add(&self, disposable: DisposableRef) -> bool {
        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => {
                    disposable.dispose();
                    return false;
                }
                State::Active(members) => {
                    if members
                        .iter()
                        .any(|member| Arc::ptr_eq(member, &disposable))
                    {
                        return true;
                    }

                    let mut next = members.clone();
                    next.push(Arc::clone(&disposable));
                    if self
                        .state
                        .compare_and_swap(&current, Arc::new(State::Active(next)))
                    {
                        return true;
                    }
                }
            }
        }
    }

    /// Detaches a member by identity without disposing it, returning whether
    /// it was present.
    pub fn remove(&self, disposable: &DisposableRef) -> bool {
        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => return false,
                State::Active(members) => {
                    let Some(index) = members
                        .iter()
                        .position(|member| Arc::ptr_eq(member, disposable))
                    else {
                        return false;
                    };

                    let mut next = members.clone();
                    next.remove(index);
                    if self
                        .state
                        .compare_and_swap(&current, Arc::new(State::Active(next)))
                    {
                        return true;
                    }
                }
            }
        }
    }

    /// Detaches all current members without changing the composite's own
    /// disposed state, disposing the removed members when `dispose_members`
    /// is set.
    pub fn clear(&self, dispose_members: bool) {
        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => return,
                State::Active(members) => {
                    if members.is_empty() {
                        return;
                    }

                    let removed = members.clone();
                    if self
                        .state
                        .compare_and_swap(&current, Arc::new(State::Active(Vec::new())))
                    {
                        if dispose_members {
                            for member in removed {
                                member.dispose();
                            }
                        }
                        return;
                    }
                }
            }
        }
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        let disposed = Arc::new(State::Disposed);

        loop {
            let current = self.state.load();
            match &*current {
                State::Disposed => return,
                State::Active(members) => {
                    let members = members.clone();
                    if self.state.compare_and_swap(&current, Arc::clone(&disposed)) {
                        for member in members {
                            member.dispose();
                        }
                        return;
                    }
                }
            }
        }
    }

    fn is_disposed(&self) -> bool {
        matches!(&*self.state.load(), State::Disposed)
    }
}

impl Default for CompositeDisposable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeDisposable")
            .field("is_disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
