//! Data structures behind the skip list map.
//!
//! - [`sorted`] - the skip list, its nodes and tower height selection
//! - [`internal`] - atomic building blocks shared by the nodes

pub mod internal;
pub mod sorted;

pub use internal::AtomicMarkableRef;
pub use sorted::level::{MAX_LEVEL_LIMIT, random_level, random_level_with};
pub use sorted::skip_list::{DEFAULT_MAX_LEVEL, SkipList};
