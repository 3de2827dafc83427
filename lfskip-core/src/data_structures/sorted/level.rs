//! Tower height selection.
//!
//! Heights are drawn from a geometric distribution with p = 1/4 and
//! truncated at the list's `max_level`:
//!
//! ```text
//! P(height = k) = (3/4) * (1/4)^(k-1)   for 1 <= k < max_level
//! P(height = max_level) = (1/4)^(max_level-1)
//! ```
//!
//! Compared with the classic p = 1/2 this keeps upper levels sparser at the
//! cost of a few more comparisons on the bottom level.

/// Upper bound accepted for `max_level`.
///
/// Each extra level consumes two random bits, and one `u64` draw covers
/// 32 levels.
pub const MAX_LEVEL_LIMIT: usize = 32;

/// Draw a tower height in `1..=max_level` from the thread-local generator.
#[inline]
pub fn random_level(max_level: usize) -> usize {
    level_from_bits(fastrand::u64(..), max_level)
}

/// Draw a tower height in `1..=max_level` from an explicit generator.
///
/// Seeded generators make height sequences reproducible in tests.
#[inline]
pub fn random_level_with(rng: &mut fastrand::Rng, max_level: usize) -> usize {
    level_from_bits(rng.u64(..), max_level)
}

/// Instead of flipping a 1/4 coin per level, count trailing zero bits of a
/// single draw: every pair of zero bits is one more level.
#[inline]
fn level_from_bits(bits: u64, max_level: usize) -> usize {
    debug_assert!(max_level >= 1);
    let extra_levels = (bits.trailing_zeros() / 2) as usize;
    (1 + extra_levels).min(max_level)
}
