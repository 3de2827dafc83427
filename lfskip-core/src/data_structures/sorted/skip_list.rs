use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::ptr;

use tracing::{debug, trace};

use super::level::{MAX_LEVEL_LIMIT, random_level};
use super::skip_node::SkipNode;
use crate::error::SkipListError;
use crate::guard::Guard;

/// Height used by `SkipList::default()`.
pub const DEFAULT_MAX_LEVEL: usize = 16;

type SkipNodePtr<K, V> = *mut SkipNode<K, V>;

// =============================================================================
// SKIP LIST INVARIANTS
// =============================================================================
//
// Skip List Structure (sorted ascending, fixed max_level):
//
// Level 2:  HEAD ─────────────────────────────────────► 30 ─────────────────► TAIL
//             │                                          │
// Level 1:  HEAD ──────────► 10 ─────────────────────► 30 ─────────────────► TAIL
//             │               │                          │
// Level 0:  HEAD ──────────► 10 ──────────► 20 ──────► 30 ──────────► 40 ──► TAIL
//
// HEAD and TAIL carry no entry. HEAD precedes every key, TAIL follows every
// key; a search never compares against either of them.
//
// Marked link: the mark on node.tower[level] means the NODE is logically
// deleted at that level. Deleters mark top-down and level 0 last; marking
// level 0 is the linearization point of a delete.
//
// INVARIANTS:
// 1. Unmarked nodes reachable at level 0 have strictly increasing keys
// 2. A fully linked node reachable at level i is reachable at levels 0..i
// 3. A node of height h only ever receives links at levels 0..h
// 4. Marks are never cleared; a marked link is never redirected
// 5. Only the thread whose CAS marks level 0 owns the deletion
//
// =============================================================================
// SEARCH (find)
// =============================================================================
//
// From HEAD, for each level max_level-1 ..= 0:
//   - walk forward while curr.key < key
//   - if curr's own link at this level is marked, snip it:
//       CAS pred.tower[level] from (curr, unmarked) to (curr.next, unmarked)
//     a failed snip restarts the whole search from HEAD at the top level,
//     since the predecessors recorded above may be stale as well
//   - record preds[level] (last node with key < target) and
//     succs[level] (first unmarked node with key >= target)
//
// A search also restarts when the predecessor carried down from the level
// above turns out to be marked at the new level. Every hop of a search
// therefore follows a link that was live when it was read, which is what the
// reclamation hand-off relies on: a search for K that starts after a node
// with key K was marked and after its last link was installed leaves that
// node unreachable at every level.
//
// =============================================================================
// RECLAMATION HAND-OFF
// =============================================================================
//
// A published node is retired exactly once, by whichever of these finishes
// last (SkipNode::release_handoff):
//
//   inserter: done linking upper levels; if it saw the node deleted it
//             first re-runs the search to snip any level it linked late
//   deleter:  won the level 0 mark and re-ran the search to snip the node
//
// When the count reaches zero no new link to the node can appear and a
// search has run after the last one, so the node is unreachable and can be
// passed to Guard::defer_destroy.
//
// =============================================================================

/// Predecessors and successors of a key at every level.
struct SearchResult<K, V> {
    found: bool,
    preds: [SkipNodePtr<K, V>; MAX_LEVEL_LIMIT],
    succs: [SkipNodePtr<K, V>; MAX_LEVEL_LIMIT],
}

enum InsertOutcome {
    Inserted,
    Present,
    GaveUp { attempts: usize },
}

/// A lock-free ordered map built on a skip list.
///
/// - Fixed `max_level` chosen at construction, no rebalancing
/// - `set` never overwrites: the first writer of a key wins
/// - `delete` is logical (mark) first, physical unlinking happens in
///   later searches
/// - `G` selects the memory reclamation strategy for unlinked nodes
/// - `K` and `V` are `'static`: a retired node may be destroyed after the
///   list itself has been dropped
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use lfskip_core::{DeferredGuard, SkipList};
///
/// let list: Arc<SkipList<u32, u32, DeferredGuard>> = Arc::new(SkipList::new(8));
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let list = Arc::clone(&list);
///         thread::spawn(move || {
///             for i in 0..100 {
///                 list.set(t * 100 + i, i);
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(list.len(), 400);
/// assert_eq!(list.get(&205), Some(5));
/// ```
///
pub struct SkipList<K, V, G: Guard> {
    head: SkipNodePtr<K, V>,
    tail: SkipNodePtr<K, V>,
    max_level: usize,
    guard: G,
    _owns: PhantomData<Box<SkipNode<K, V>>>,
}

impl<K: Ord + 'static, V: 'static, G: Guard> SkipList<K, V, G> {
    /// Create an empty list whose towers never exceed `max_level`.
    ///
    /// # Panics
    /// If `max_level` is outside `1..=MAX_LEVEL_LIMIT`; see [`SkipList::try_new`].
    pub fn new(max_level: usize) -> Self {
        match Self::try_new(max_level) {
            Ok(list) => list,
            Err(err) => panic!("{}", err),
        }
    }

    /// Create an empty list, validating `max_level`.
    pub fn try_new(max_level: usize) -> Result<Self, SkipListError> {
        if !(1..=MAX_LEVEL_LIMIT).contains(&max_level) {
            return Err(SkipListError::InvalidMaxLevel {
                max_level,
                limit: MAX_LEVEL_LIMIT,
            });
        }

        let tail = SkipNode::alloc_tail(max_level);
        let head = SkipNode::alloc_sentinel(max_level, tail);
        debug!(max_level, "skip list created");

        Ok(SkipList {
            head,
            tail,
            max_level,
            guard: G::default(),
            _owns: PhantomData,
        })
    }

    #[inline]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// The reclamation guard retired nodes are handed to.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Locate `key` at every level, snipping marked nodes on the way.
    ///
    /// Must be called with a read guard pinned.
    fn search(&self, key: &K) -> SearchResult<K, V> {
        let mut preds: [SkipNodePtr<K, V>; MAX_LEVEL_LIMIT] = [ptr::null_mut(); MAX_LEVEL_LIMIT];
        let mut succs: [SkipNodePtr<K, V>; MAX_LEVEL_LIMIT] = [ptr::null_mut(); MAX_LEVEL_LIMIT];

        'retry: loop {
            let mut pred = self.head;

            for level in (0..self.max_level).rev() {
                let (mut curr, pred_marked) = unsafe { (*pred).link(level).get() };
                if pred_marked {
                    trace!(level, "search restart: predecessor deleted");
                    continue 'retry;
                }

                while curr != self.tail {
                    let (succ, curr_marked) = unsafe { (*curr).link(level).get() };

                    if curr_marked {
                        let snipped = unsafe {
                            (*pred)
                                .link(level)
                                .compare_and_set(curr, succ, false, false)
                        };
                        if !snipped {
                            trace!(level, "search restart: snip lost a race");
                            continue 'retry;
                        }
                        curr = succ;
                        continue;
                    }

                    debug_assert!(
                        unsafe { !(*curr).is_sentinel() },
                        "INVARIANT VIOLATION: sentinel reached as curr at level {}",
                        level
                    );

                    match unsafe { (*curr).key() } {
                        Some(curr_key) if curr_key < key => {
                            pred = curr;
                            curr = succ;
                        }
                        _ => break,
                    }
                }

                preds[level] = pred;
                succs[level] = curr;
            }

            let found = unsafe { (*succs[0]).key() } == Some(key);
            return SearchResult {
                found,
                preds,
                succs,
            };
        }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert `key` → `value` if `key` is absent.
    ///
    /// Returns `true` if this call inserted the key, `false` if the key was
    /// already present; an existing value is never replaced.
    pub fn set(&self, key: K, value: V) -> bool {
        matches!(
            self.insert_internal(key, value, usize::MAX),
            InsertOutcome::Inserted
        )
    }

    /// Like [`SkipList::set`], but gives up after `max_attempts` contended
    /// attempts to link the new node at level 0.
    ///
    /// At least one attempt is always made. Once the node is linked at
    /// level 0 the key is present and the call returns `Ok(true)`; the
    /// remaining upper levels are linked without a bound.
    pub fn try_set(&self, key: K, value: V, max_attempts: usize) -> Result<bool, SkipListError> {
        match self.insert_internal(key, value, max_attempts) {
            InsertOutcome::Inserted => Ok(true),
            InsertOutcome::Present => Ok(false),
            InsertOutcome::GaveUp { attempts } => {
                Err(SkipListError::RetriesExhausted { attempts })
            }
        }
    }

    fn insert_internal(&self, key: K, value: V, max_attempts: usize) -> InsertOutcome {
        let _guard = G::pin();

        let height = random_level(self.max_level);
        let node = SkipNode::alloc_with_entry(key, value, height, self.tail);
        // The node stays alive until its inserter releases the hand-off
        let node_key = match unsafe { (*node).key() } {
            Some(key) => key,
            None => unreachable!("data node without an entry"),
        };

        let mut failures = 0;
        let position = loop {
            let position = self.search(node_key);
            if position.found {
                // Never published, nobody else can see it
                unsafe { SkipNode::dealloc_node(node) };
                return InsertOutcome::Present;
            }

            unsafe {
                for level in 0..height {
                    (*node).link(level).set(position.succs[level], false);
                }

                if (*position.preds[0])
                    .link(0)
                    .compare_and_set(position.succs[0], node, false, false)
                {
                    break position;
                }
            }

            failures += 1;
            trace!(failures, "level 0 link contended, retrying");
            if failures >= max_attempts {
                unsafe { SkipNode::dealloc_node(node) };
                return InsertOutcome::GaveUp { attempts: failures };
            }
        };

        unsafe {
            self.link_upper_levels(node, node_key, position);

            if (*node).is_deleted() {
                // Deleted while we were linking: snip whatever we linked late
                self.search(node_key);
            }
            self.release_handoff(node);
        }

        InsertOutcome::Inserted
    }

    /// Link a node already live at level 0 into levels `1..height`,
    /// bottom-up. Stops early if a deleter marks the node.
    ///
    /// # Safety
    /// `node` must be linked at level 0 and its inserter's hand-off must
    /// still be held.
    unsafe fn link_upper_levels(
        &self,
        node: SkipNodePtr<K, V>,
        node_key: &K,
        mut position: SearchResult<K, V>,
    ) {
        unsafe {
            let height = (*node).height();

            'levels: for level in 1..height {
                loop {
                    let succ = position.succs[level];

                    // Point our own link at the fresh successor. Nobody else
                    // writes it before we link this level, except a deleter
                    // setting the mark.
                    let (current, marked) = (*node).link(level).get();
                    if marked {
                        trace!(level, height, "node deleted, upper linking abandoned");
                        break 'levels;
                    }
                    if current != succ
                        && !(*node)
                            .link(level)
                            .compare_and_set(current, succ, false, false)
                    {
                        continue;
                    }

                    if (*position.preds[level])
                        .link(level)
                        .compare_and_set(succ, node, false, false)
                    {
                        continue 'levels;
                    }

                    trace!(level, "upper level link contended, refreshing search");
                    position = self.search(node_key);
                }
            }
        }
    }

    /// Give up one hand-off party; the last one retires the node.
    ///
    /// # Safety
    /// Each party may release a given node only once.
    unsafe fn release_handoff(&self, node: SkipNodePtr<K, V>) {
        unsafe {
            if (*node).release_handoff() {
                self.guard.defer_destroy(node, SkipNode::dealloc_node);
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Logically delete `key`.
    ///
    /// Returns `true` only for the call that performed the deletion; `false`
    /// if the key was absent or another caller deleted it first.
    pub fn delete(&self, key: &K) -> bool {
        let _guard = G::pin();

        let position = self.search(key);
        if !position.found {
            return false;
        }
        let node = position.succs[0];

        unsafe {
            // Higher levels first (height-1 down to 1); any number of
            // deleters may help here, only the mark matters
            for level in (1..(*node).height()).rev() {
                let link = (*node).link(level);
                while !link.attempt_mark(link.get_reference(), true) {}
            }

            // Level 0 decides ownership. A failed CAS either means another
            // deleter marked it or the successor moved; re-read and retry.
            let link = (*node).link(0);
            let we_own = loop {
                let (succ, marked) = link.get();
                if marked {
                    break false;
                }
                if link.compare_and_set(succ, succ, false, true) {
                    break true;
                }
            };

            if !we_own {
                trace!("delete lost the level 0 mark to another deleter");
                return false;
            }

            // Physically unlink at every level before letting go
            self.search(key);
            self.release_handoff(node);
        }

        true
    }

    // =========================================================================
    // Derived reads
    // =========================================================================

    /// Apply `f` to the value stored under `key`, if present.
    pub fn get_and_apply<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        let _guard = G::pin();
        let node = self.find_live(key)?;
        unsafe { (*node).value().map(f) }
    }

    /// Clone of the value stored under `key`, if present.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_and_apply(key, V::clone)
    }

    /// Guard-protected reference to the value stored under `key`.
    pub fn get_ref(&self, key: &K) -> Option<G::GuardedRef<'_, V>> {
        let _guard = G::pin();
        let node = self.find_live(key)?;
        let value = unsafe { (*node).value()? } as *const V;

        // Safety: pinned above; make_ref takes its own protection
        unsafe { Some(G::make_ref(value)) }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get_and_apply(key, |_| ()).is_some()
    }

    /// Matching node whose level 0 mark is clear. Caller must be pinned.
    fn find_live(&self, key: &K) -> Option<SkipNodePtr<K, V>> {
        let position = self.search(key);
        if !position.found {
            return None;
        }
        let node = position.succs[0];
        if unsafe { (*node).is_deleted() } {
            return None;
        }
        Some(node)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Visit unmarked entries on level 0 in key order until `f` breaks.
    ///
    /// Weakly consistent while writers are active: entries inserted or
    /// deleted during the walk may or may not be seen.
    fn walk_live<F>(&self, mut f: F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        let _guard = G::pin();
        let mut curr = unsafe { (*self.head).link(0).get_reference() };

        while curr != self.tail {
            let (next, marked) = unsafe { (*curr).link(0).get() };
            if !marked {
                if let Some((key, value)) = unsafe { (*curr).entry() } {
                    f(key, value)?;
                }
            }
            curr = next;
        }
        ControlFlow::Continue(())
    }

    /// Snapshot of the bottom level, in key order.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut entries = Vec::new();
        let _ = self.walk_live(|key, value| {
            entries.push((key.clone(), value.clone()));
            ControlFlow::Continue(())
        });
        entries
    }

    /// Keys on the bottom level, in key order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::new();
        let _ = self.walk_live(|key, _| {
            keys.push(key.clone());
            ControlFlow::Continue(())
        });
        keys
    }

    /// Number of live entries; walks the bottom level.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let _ = self.walk_live(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        });
        count
    }

    pub fn is_empty(&self) -> bool {
        self.walk_live(|_, _| ControlFlow::Break(())).is_continue()
    }

    /// Number of nodes linked at each level, marked or not.
    ///
    /// Only meaningful once the list is quiescent.
    pub fn level_counts(&self) -> Vec<usize> {
        let _guard = G::pin();
        (0..self.max_level)
            .map(|level| {
                let mut count = 0;
                let mut curr = unsafe { (*self.head).link(level).get_reference() };
                while curr != self.tail {
                    count += 1;
                    curr = unsafe { (*curr).link(level).get_reference() };
                }
                count
            })
            .collect()
    }
}

impl<K: Ord + 'static, V: 'static, G: Guard> Default for SkipList<K, V, G> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEVEL)
    }
}

impl<K, V, G: Guard> Drop for SkipList<K, V, G> {
    fn drop(&mut self) {
        unsafe {
            let mut curr = (*self.head).link(0).get_reference();

            while curr != self.tail {
                let (next, marked) = (*curr).link(0).get();
                // Deleted nodes belong to the reclamation hand-off. Once every
                // operation has returned none of them is still linked.
                debug_assert!(
                    !marked,
                    "INVARIANT VIOLATION: deleted node still linked at drop time"
                );
                if !marked {
                    SkipNode::dealloc_node(curr);
                }
                curr = next;
            }

            SkipNode::dealloc_node(self.head);
            SkipNode::dealloc_node(self.tail);
        }
    }
}

// Safety: all shared state is reached through atomic links, and retired
// nodes are only freed through the guard
unsafe impl<K: Send + Sync, V: Send + Sync, G: Guard> Send for SkipList<K, V, G> {}
unsafe impl<K: Send + Sync, V: Send + Sync, G: Guard> Sync for SkipList<K, V, G> {}

// ============================================================================
// Tests
// ============================================================================
