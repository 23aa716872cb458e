//! Deterministic RNG utilities for reproducible tests.

use nalgebra::{UnitQuaternion, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Generate a deterministic `Vec<f64>` in `[0, 1)` of length `dim`.
pub fn deterministic_vec(dim: usize, seed: u64) -> Vec<f64> {
    let mut rng = seeded_rng(seed);
    (0..dim).map(|_| rng.r#gen::<f64>()).collect()
}

/// Vector with components uniform in `[-scale, scale)`.
pub fn random_vector3(rng: &mut impl Rng, scale: f64) -> Vector3<f64> {
    Vector3::new(
        rng.gen_range(-scale..scale),
        rng.gen_range(-scale..scale),
        rng.gen_range(-scale..scale),
    )
}

/// Rotation from uniformly drawn Euler angles.
pub fn random_rotation(rng: &mut impl Rng) -> UnitQuaternion<f64> {
    use std::f64::consts::PI;
    UnitQuaternion::from_euler_angles(
        rng.gen_range(-PI..PI),
        rng.gen_range(-PI..PI),
        rng.gen_range(-PI..PI),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
