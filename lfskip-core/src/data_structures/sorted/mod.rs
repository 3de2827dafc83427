//! Lock-free skip list.
//!
//! The list is parameterized by a guard type `G: Guard` that determines
//! the memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until guard drops
//! - `EpochGuard`: Production - epoch-based reclamation (crossbeam-epoch)

pub mod level;
pub mod skip_list;
pub(crate) mod skip_node;

pub use level::{MAX_LEVEL_LIMIT, random_level, random_level_with};
pub use skip_list::{DEFAULT_MAX_LEVEL, SkipList};
