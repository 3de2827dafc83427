use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::data_structures::AtomicMarkableRef;

/// Parties that must let go of a published node before it can be retired:
/// the inserter (still linking upper levels) and the deleter that won the
/// level 0 mark.
const HANDOFF_PARTIES: usize = 2;

/// A skip list node: one key/value entry plus its tower of forward links.
///
/// Layout:
/// - `entry`: `Some((key, value))` for data nodes, `None` for the head and
///   tail sentinels
/// - `tower[i]`: successor at level `i`, for `i in 0..height`; the mark on
///   `tower[i]` means this node is logically deleted at level `i`
/// - `handoff`: outstanding parties before the node may be retired
///
/// A node of height `h` owns exactly `h` links. Sentinels are built with the
/// list's `max_level`, so every level a search visits is a valid index on
/// every node it can meet there.
///
pub struct SkipNode<K, V> {
    entry: Option<(K, V)>,
    handoff: AtomicUsize,
    tower: Box<[AtomicMarkableRef<SkipNode<K, V>>]>,
}

impl<K, V> SkipNode<K, V> {
    fn alloc(entry: Option<(K, V)>, height: usize, succ: *mut Self) -> *mut Self {
        let tower = (0..height)
            .map(|_| AtomicMarkableRef::new(succ, false))
            .collect();
        Box::into_raw(Box::new(SkipNode {
            entry,
            handoff: AtomicUsize::new(HANDOFF_PARTIES),
            tower,
        }))
    }

    /// Allocate a data node whose links all point at `succ` (the tail
    /// sentinel) until the inserter wires them up.
    pub(crate) fn alloc_with_entry(key: K, value: V, height: usize, succ: *mut Self) -> *mut Self {
        debug_assert!(height >= 1);
        Self::alloc(Some((key, value)), height, succ)
    }

    /// Allocate a sentinel node with `height` links pointing at `succ`.
    pub(crate) fn alloc_sentinel(height: usize, succ: *mut Self) -> *mut Self {
        Self::alloc(None, height, succ)
    }

    /// Allocate the tail sentinel: `height` null links that are never followed.
    pub(crate) fn alloc_tail(height: usize) -> *mut Self {
        Self::alloc(None, height, ptr::null_mut())
    }

    /// Deallocate a node.
    ///
    /// # Safety
    /// The pointer must come from one of the `alloc_*` functions, must not be
    /// reachable by any thread, and must be deallocated only once.
    pub(crate) unsafe fn dealloc_node(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[inline]
    pub(crate) fn is_sentinel(&self) -> bool {
        self.entry.is_none()
    }

    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.tower.len()
    }

    #[inline]
    pub(crate) fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<(&K, &V)> {
        self.entry.as_ref().map(|(key, value)| (key, value))
    }

    /// Forward link at `level`.
    #[inline]
    pub(crate) fn link(&self, level: usize) -> &AtomicMarkableRef<SkipNode<K, V>> {
        &self.tower[level]
    }

    /// A node is logically deleted once its level 0 link is marked.
    #[inline]
    pub(crate) fn is_deleted(&self) -> bool {
        self.link(0).get_mark()
    }

    /// Drop one hand-off party. Returns `true` for the last one, which is
    /// then responsible for retiring the node.
    #[inline]
    pub(crate) fn release_handoff(&self) -> bool {
        self.handoff.fetch_sub(1, Ordering::AcqRel) == 1
    }
}
