//! Shared test fixtures and utilities for the retarget crates.
//!
//! Provides deterministic RNG setup, generated kinematic trees, a small
//! humanoid description and synthetic motion clips.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{HUMANOID_MJCF, humanoid_tree};
pub use rng::seeded_rng;
