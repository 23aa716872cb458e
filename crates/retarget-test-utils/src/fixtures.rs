//! Deterministic trees and motion clips for tests.

// Fixture sizes are small; index to f64 conversions are exact.
#![allow(clippy::cast_precision_loss)]

use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use rand::seq::SliceRandom;

use retarget_model::{Tree, TreeBuilder, load_mjcf_str};
use retarget_motion::MotionSample;

use crate::rng::{random_rotation, random_vector3};

// ---------------------------------------------------------------------------
// Trees
// ---------------------------------------------------------------------------

/// A small humanoid with the DASH link names.
///
/// The torso sits 0.9 m above the origin and both feet end 0.05 m above it.
/// The right shoulder is rolled a quarter turn about X.
pub const HUMANOID_MJCF: &str = r#"
<mujoco model="dash_fixture">
    <compiler angle="radian"/>
    <worldbody>
        <body name="torso" pos="0 0 0.9">
            <freejoint name="root"/>
            <body name="head" pos="0 0 0.5"/>
            <body name="r_hip" pos="0 -0.08 -0.1">
                <joint name="r_hip_yaw" range="-1.2 1.2"/>
                <body name="r_upper_leg" pos="0 0 -0.35">
                    <joint name="r_knee" axis="0 1 0" range="0 2.4"/>
                    <body name="r_foot" pos="0 0 -0.4">
                        <joint name="r_ankle" axis="0 1 0"/>
                    </body>
                </body>
            </body>
            <body name="l_hip" pos="0 0.08 -0.1">
                <joint name="l_hip_yaw" range="-1.2 1.2"/>
                <body name="l_upper_leg" pos="0 0 -0.35">
                    <joint name="l_knee" axis="0 1 0" range="0 2.4"/>
                    <body name="l_foot" pos="0 0 -0.4">
                        <joint name="l_ankle" axis="0 1 0"/>
                    </body>
                </body>
            </body>
            <body name="r_prox_shoulder" pos="0 -0.15 0.35" quat="0.7071067811865476 0.7071067811865476 0 0">
                <joint name="r_shoulder" type="ball"/>
                <body name="r_upper_arm" pos="0 0 -0.05">
                    <joint name="r_elbow"/>
                    <body name="r_lower_arm" pos="0 0 -0.25"/>
                </body>
            </body>
            <body name="l_prox_shoulder" pos="0 0.15 0.35">
                <joint name="l_shoulder" type="ball"/>
                <body name="l_upper_arm" pos="0 0.05 0">
                    <joint name="l_elbow"/>
                    <body name="l_lower_arm" pos="0 0 -0.25"/>
                </body>
            </body>
        </body>
    </worldbody>
</mujoco>
"#;

/// Parse [`HUMANOID_MJCF`].
pub fn humanoid_tree() -> Tree {
    load_mjcf_str(HUMANOID_MJCF).expect("humanoid fixture is valid MJCF")
}

/// A chain of `len` bodies with identity local transforms.
pub fn identity_tree(len: usize) -> Tree {
    let mut tree = Tree::new("identity");
    for i in 0..len {
        let parent = (i > 0).then(|| format!("link_{}", i - 1));
        tree.add_body(
            format!("link_{i}"),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            parent.as_deref(),
        )
        .expect("chain is built root to leaf");
    }
    tree
}

/// A chain of `len` bodies with random local offsets and rotations.
pub fn random_chain_tree(rng: &mut impl Rng, len: usize) -> Tree {
    let mut tree = Tree::new("random_chain");
    for i in 0..len {
        let parent = (i > 0).then(|| format!("link_{}", i - 1));
        tree.add_body(
            format!("link_{i}"),
            random_vector3(rng, 0.5),
            random_rotation(rng),
            parent.as_deref(),
        )
        .expect("chain is built root to leaf");
    }
    tree
}

/// A random tree of `size` bodies, declared in shuffled order.
///
/// Body `i > 0` hangs off a random earlier body; roughly one in ten bodies
/// is an extra root.
pub fn random_branching_tree(rng: &mut impl Rng, size: usize) -> Tree {
    let mut decls: Vec<(String, Option<String>)> = (0..size)
        .map(|i| {
            let parent = if i == 0 || rng.gen_ratio(1, 10) {
                None
            } else {
                Some(format!("body_{:03}", rng.gen_range(0..i)))
            };
            (format!("body_{i:03}"), parent)
        })
        .collect();
    decls.shuffle(rng);

    let mut builder = TreeBuilder::new("random_branching");
    for (name, parent) in decls {
        builder.body(
            name,
            random_vector3(rng, 0.5),
            random_rotation(rng),
            parent.as_deref(),
        );
    }
    builder.build().expect("every parent is declared")
}

// ---------------------------------------------------------------------------
// Motion clips
// ---------------------------------------------------------------------------

/// Every body holds `position` for `frames` frames.
pub fn constant_clip(names: &[&str], frames: usize, position: Vector3<f64>) -> Vec<MotionSample> {
    (0..frames)
        .map(|_| names.iter().map(|n| (*n, position)).collect())
        .collect()
}

/// Each body sways around its own random base point.
pub fn random_clip(
    rng: &mut impl Rng,
    names: &[&str],
    frames: usize,
    amplitude: f64,
) -> Vec<MotionSample> {
    let bases: Vec<Vector3<f64>> = names.iter().map(|_| random_vector3(rng, 1.0)).collect();
    (0..frames)
        .map(|_| {
            names
                .iter()
                .zip(&bases)
                .map(|(n, base)| (*n, base + random_vector3(rng, amplitude)))
                .collect()
        })
        .collect()
}

/// Every body moves along X as `amplitude * sin(2π k / frames)`.
pub fn oscillating_clip(names: &[&str], frames: usize, amplitude: f64) -> Vec<MotionSample> {
    (0..frames)
        .map(|k| {
            let phase = std::f64::consts::TAU * k as f64 / frames as f64;
            let x = amplitude * phase.sin();
            names.iter().map(|n| (*n, Vector3::new(x, 0.0, 0.0))).collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
