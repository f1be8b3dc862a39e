//! Reviewer candidate selection.
//!
//! Pure functions over a candidate pool that has already been filtered to
//! active teammates minus the exclusions. Callers pass the random source;
//! production code uses `rand::thread_rng()`, which is per-thread and seeded
//! from the OS, so concurrent requests never share a generator.

use rand::seq::SliceRandom;
use rand::Rng;

/// Maximum reviewers assigned when a pull request is created.
pub const INITIAL_REVIEWER_COUNT: usize = 2;

/// Pick up to [`INITIAL_REVIEWER_COUNT`] distinct reviewers, uniformly at random.
///
/// Pools smaller than that yield every candidate; an empty pool yields an
/// empty list.
pub fn select_initial_reviewers<R: Rng + ?Sized>(
    mut candidates: Vec<String>,
    rng: &mut R,
) -> Vec<String> {
    candidates.shuffle(rng);
    candidates.truncate(INITIAL_REVIEWER_COUNT);
    candidates
}

/// Pick exactly one replacement reviewer, uniformly at random.
///
/// Returns `None` when the pool is empty.
pub fn select_replacement<R: Rng + ?Sized>(candidates: &[String], rng: &mut R) -> Option<String> {
    candidates.choose(rng).cloned()
}
