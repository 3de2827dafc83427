//! Internal implementation details.

pub mod markable_ref;

pub use markable_ref::AtomicMarkableRef;
