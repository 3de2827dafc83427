// Atomic (reference, mark) pair packed into a single pointer word.
//
// Bit layout of the stored word:
//   Bits 1..: address of the referenced node (nodes are at least 2-byte aligned)
//   Bit 0:    DELETE_MARK - the node owning this link is logically deleted
//
// Both halves travel in one AtomicPtr, so every load sees a pair some writer
// actually stored and every CAS compares and replaces both halves at once.
//
// Loads and CASes are SeqCst. An inserter linking level i then checking the
// level 0 mark, racing a deleter marking level 0 then searching level i, must
// not both miss the other's write.
//
use std::fmt;
use std::sync::atomic::{AtomicPtr, Ordering};

const DELETE_MARK: usize = 0b1;

/// An atomically updatable `(reference, mark)` pair.
///
/// This is the building block of the skip list tower: each level of a node
/// holds one `AtomicMarkableRef` pointing at the successor on that level, and
/// the mark records that the node holding the link has been logically
/// deleted at that level.
///
/// The reference may be null. `T` must be at least 2-byte aligned since the
/// lowest address bit carries the mark.
///
pub struct AtomicMarkableRef<T> {
    word: AtomicPtr<T>,
}

impl<T> AtomicMarkableRef<T> {
    const ALIGNED: () = assert!(
        std::mem::align_of::<T>() >= 2,
        "AtomicMarkableRef needs a free low address bit for the mark"
    );

    // =========================================================================
    // Packing
    // =========================================================================

    #[inline]
    fn pack(reference: *mut T, mark: bool) -> *mut T {
        debug_assert_eq!(
            reference as usize & DELETE_MARK,
            0,
            "reference {:?} is not aligned",
            reference
        );
        if mark {
            (reference as usize | DELETE_MARK) as *mut T
        } else {
            reference
        }
    }

    #[inline]
    fn unpack(word: *mut T) -> (*mut T, bool) {
        (
            (word as usize & !DELETE_MARK) as *mut T,
            word as usize & DELETE_MARK != 0,
        )
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a pair holding `reference` and `mark`.
    #[inline]
    pub fn new(reference: *mut T, mark: bool) -> Self {
        let () = Self::ALIGNED;
        AtomicMarkableRef {
            word: AtomicPtr::new(Self::pack(reference, mark)),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read reference and mark together.
    #[inline]
    pub fn get(&self) -> (*mut T, bool) {
        Self::unpack(self.word.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn get_reference(&self) -> *mut T {
        self.get().0
    }

    #[inline]
    pub fn get_mark(&self) -> bool {
        self.get().1
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Unconditionally store a new pair.
    ///
    /// Only sound on links no other thread can race with, e.g. the tower of a
    /// node that has not been published yet.
    #[inline]
    pub fn set(&self, reference: *mut T, mark: bool) {
        self.word.store(Self::pack(reference, mark), Ordering::Release);
    }

    /// Replace `(expected_reference, expected_mark)` with
    /// `(new_reference, new_mark)` in one atomic step.
    ///
    /// Succeeds only if the stored pair equals the expected pair exactly; a
    /// mismatch in either half fails without touching the link.
    #[inline]
    pub fn compare_and_set(
        &self,
        expected_reference: *mut T,
        new_reference: *mut T,
        expected_mark: bool,
        new_mark: bool,
    ) -> bool {
        self.word
            .compare_exchange(
                Self::pack(expected_reference, expected_mark),
                Self::pack(new_reference, new_mark),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Set the mark to `new_mark` if the reference is still
    /// `expected_reference`, whatever the current mark is.
    ///
    /// Returns `true` if the pair now holds `(expected_reference, new_mark)`.
    pub fn attempt_mark(&self, expected_reference: *mut T, new_mark: bool) -> bool {
        let mut current = self.word.load(Ordering::SeqCst);
        loop {
            let (reference, mark) = Self::unpack(current);
            if reference != expected_reference {
                return false;
            }
            if mark == new_mark {
                return true;
            }
            match self.word.compare_exchange_weak(
                current,
                Self::pack(reference, new_mark),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl<T> fmt::Debug for AtomicMarkableRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (reference, mark) = self.get();
        f.debug_struct("AtomicMarkableRef")
            .field("reference", &reference)
            .field("mark", &mark)
            .finish()
    }
}

// Safety: the pair is only ever accessed through atomic operations
unsafe impl<T> Send for AtomicMarkableRef<T> {}
unsafe impl<T> Sync for AtomicMarkableRef<T> {}
