//! `Guard` backed by crossbeam-epoch.
//!
//! Every skip list operation pins the calling thread for its duration
//! (`Guard::pin`). A node retired through `defer_destroy` is queued on the
//! global collector and freed only after every thread pinned at retirement
//! time has unpinned, so a search that loaded the node before it was snipped
//! can finish walking through it.
//!
//! ```text
//! delete(k) ── mark ── search snips ── release hand-off
//!                                            │
//!                                            └── EpochGuard::defer_destroy
//!                                                   │
//!                                                   └── freed two epochs later
//! ```

use std::fmt;
use std::ops::Deref;

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use lfskip_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// Zero-sized: all state lives in the global epoch collector, so a list
/// holding an `EpochGuard` stays `Send + Sync` and costs nothing extra.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochGuard;

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard
    }

    /// Push this thread's pending retirements to the global queue and try
    /// to advance the epoch.
    ///
    /// Reclamation normally happens on its own as threads pin and unpin;
    /// this is only useful to make it observable sooner, e.g. in tests.
    pub fn flush() {
        epoch::pin().flush();
    }
}

/// A value reference that keeps the current thread pinned.
///
/// The value cannot be freed while the `EpochRef` lives, even if its key is
/// deleted concurrently.
pub struct EpochRef<'a, T> {
    _guard: CrossbeamGuard,
    reference: &'a T,
}

impl<'a, T> EpochRef<'a, T> {
    /// # Safety
    ///
    /// `reference` must point into a node that is not freed while `guard`
    /// stays pinned.
    unsafe fn new(guard: CrossbeamGuard, reference: &'a T) -> Self {
        EpochRef {
            _guard: guard,
            reference,
        }
    }

    pub fn get(&self) -> &T {
        self.reference
    }
}

impl<T> Deref for EpochRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.reference
    }
}

impl<T: fmt::Display> fmt::Display for EpochRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.reference, f)
    }
}

impl<T: fmt::Debug> fmt::Debug for EpochRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpochRef({:?})", self.reference)
    }
}

impl Guard for EpochGuard {
    type GuardedRef<'a, T: 'a> = EpochRef<'a, T>;

    /// A pinned crossbeam guard; the thread stays pinned until it drops.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // The closure may run on whichever thread collects the bag
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || dealloc(node));
        }
    }

    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T> {
        let guard = epoch::pin();
        unsafe { EpochRef::new(guard, &*ptr) }
    }
}
