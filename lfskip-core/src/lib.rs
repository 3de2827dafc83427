//! Lock-free concurrent skip list map.
//!
//! Any number of threads may `set`, `delete` and `get` keys of one
//! [`SkipList`] at the same time without locks. Unlinked nodes are handed to
//! a [`Guard`] that decides when they may be freed; [`DeferredGuard`] keeps
//! them until the list drops, `lfskip_crossbeam::EpochGuard` reclaims them
//! through crossbeam-epoch.

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{
    AtomicMarkableRef, DEFAULT_MAX_LEVEL, MAX_LEVEL_LIMIT, SkipList, random_level,
    random_level_with,
};
pub use error::SkipListError;
// Re-export guard types for convenience
pub use guard::{DeferredGuard, DeferredRef, Guard};
