//! Epoch-based memory reclamation for `lfskip-core`.
//!
//! Plug [`EpochGuard`] into a [`SkipList`] to have deleted nodes freed by
//! crossbeam-epoch once no thread can still be reading them.
//!
//! # Usage
//!
//! ```rust
//! use lfskip_crossbeam::EpochSkipList;
//!
//! let list: EpochSkipList<i32, String> = EpochSkipList::new(12);
//! list.set(42, "answer".to_string());
//!
//! if let Some(value) = list.get_ref(&42) {
//!     assert_eq!(value.as_str(), "answer");
//! }
//!
//! assert!(list.delete(&42));
//! ```

pub mod epoch_guard;

pub use epoch_guard::{EpochGuard, EpochRef};
pub use lfskip_core::SkipList;

/// Skip list whose retired nodes are reclaimed by crossbeam-epoch.
///
/// Keys and values must be `'static`: the global collector may destroy a
/// retired node after the list is dropped, so values cannot borrow from a
/// shorter-lived owner.
///
/// ```compile_fail
/// use lfskip_crossbeam::EpochSkipList;
///
/// let owner = String::from("short-lived");
/// let list: EpochSkipList<u32, &str> = EpochSkipList::new(4);
/// list.set(1, owner.as_str());
/// list.delete(&1);
/// drop(list);
/// drop(owner);
/// ```
pub type EpochSkipList<K, V> = SkipList<K, V, EpochGuard>;
