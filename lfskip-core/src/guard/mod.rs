//! Guard trait for memory reclamation strategies.
//!
//! Skip list nodes are shared by every thread that can reach them, so an
//! unlinked node cannot be freed on the spot: another thread may have loaded
//! a pointer to it just before it was snipped. The `Guard` trait abstracts
//! over how retired nodes are kept alive until that can no longer happen.
//!
//! ```text
//! SkipList<K, V, G: Guard>
//!     │
//!     ├── SkipList<K, V, EpochGuard>      (production, lfskip-crossbeam)
//!     └── SkipList<K, V, DeferredGuard>   (testing / short-lived batches)
//! ```
//!
//! # Example
//!
//! ```rust
//! use lfskip_core::{DeferredGuard, SkipList};
//!
//! let list: SkipList<u32, &str, DeferredGuard> = SkipList::new(8);
//! assert!(list.set(1, "one"));
//! assert!(list.delete(&1));
//! // the retired node is freed when `list` (and its guard) drops
//! ```

mod deferred_guard;

use std::ops::Deref;

pub use deferred_guard::{DeferredGuard, DeferredRef};

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// - **EpochGuard**: low overhead, batched reclamation (crossbeam-epoch)
/// - **DeferredGuard**: defers all destruction until the guard drops
///
/// # Safety Contract
///
/// Implementations must ensure:
/// 1. Nodes passed to `defer_destroy` are not freed while any read guard
///    pinned before the call is still alive
/// 2. `GuardedRef` keeps the referenced data valid for its lifetime
///
/// The guard stored in a list is only used to schedule destruction. Thread
/// pinning happens per operation through [`Guard::pin`].
///
pub trait Guard: Sized + Default + Send + Sync {
    /// A reference protected by a guard of this type.
    type GuardedRef<'a, T: 'a>: Deref<Target = T>;

    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this is a pinned `crossbeam_epoch::Guard`;
    /// for deferred guards it is `()`.
    type ReadGuard: Sized;

    /// Pin an active read guard.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the list
    /// - `node` must be unreachable from the list and must never be linked again
    /// - `node` must not be scheduled twice
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    /// `N: 'static` because a backend may run `dealloc` after the list that
    /// retired the node, and anything the node borrows, is gone.
    ///
    unsafe fn defer_destroy<N: 'static>(&self, node: *mut N, dealloc: unsafe fn(*mut N));

    /// Create a guarded reference from a raw pointer.
    ///
    /// # Safety
    ///
    /// - `ptr` must point to valid data protected by a currently pinned guard
    /// - The data must remain valid for lifetime `'a`
    ///
    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T>;
}
