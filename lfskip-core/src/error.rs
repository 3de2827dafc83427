/// Errors surfaced by skip list construction and bounded operations.
///
/// The core operations (`set`, `delete`, `get`) never fail: contention is
/// retried internally and outcomes are reported as `bool` / `Option`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipListError {
    #[error("max level {max_level} is out of range (expected 1..={limit})")]
    InvalidMaxLevel { max_level: usize, limit: usize },
    #[error("insert gave up after {attempts} contended attempts")]
    RetriesExhausted { attempts: usize },
}
