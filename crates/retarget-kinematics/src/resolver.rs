//! World-transform resolution.
//!
//! [`resolve`] walks a [`Tree`] depth-first from every root and composes
//! each body's local offset onto its parent's world transform:
//!
//! ```text
//! t(B) = t(P) + R(P) · t_local(B)
//! R(B) = R(P) · R_local(B)
//! ```
//!
//! Rotations are re-normalized after every composition so long chains do not
//! drift. Bodies that no root reaches can only sit on a parent cycle; they
//! are walked along their parent links to name the cycle.

use std::collections::{BTreeMap, HashMap, HashSet};

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use retarget_model::Tree;

use crate::error::ResolveError;

// ---------------------------------------------------------------------------
// ResolvedTransforms
// ---------------------------------------------------------------------------

/// World transform of every body in a tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedTransforms {
    transforms: BTreeMap<String, Isometry3<f64>>,
    order: Vec<String>,
}

impl ResolvedTransforms {
    /// World transform of a body.
    pub fn get(&self, name: &str) -> Option<&Isometry3<f64>> {
        self.transforms.get(name)
    }

    /// World translation of a body.
    pub fn translation(&self, name: &str) -> Option<Vector3<f64>> {
        self.get(name).map(|iso| iso.translation.vector)
    }

    /// World rotation of a body.
    pub fn rotation(&self, name: &str) -> Option<UnitQuaternion<f64>> {
        self.get(name).map(|iso| iso.rotation)
    }

    /// Whether a body was resolved.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Body names in the order they were resolved; parents precede children.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Iterate over `(name, transform)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Isometry3<f64>)> {
        self.transforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Lowest and highest world z over all bodies.
    pub fn vertical_extent(&self) -> Option<(f64, f64)> {
        self.transforms
            .values()
            .map(|iso| iso.translation.vector.z)
            .fold(None, |acc, z| match acc {
                None => Some((z, z)),
                Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
            })
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

/// Compute the world transform of every body in `tree`.
pub fn resolve(tree: &Tree) -> Result<ResolvedTransforms, ResolveError> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for body in tree.bodies() {
        if let Some(parent) = &body.parent {
            children.entry(parent.as_str()).or_default().push(&body.name);
        }
    }

    let mut resolved = ResolvedTransforms::default();
    let mut stack: Vec<(&str, Isometry3<f64>)> = tree
        .roots()
        .map(|b| (b.name.as_str(), Isometry3::identity()))
        .collect();
    // Pop in name order.
    stack.reverse();

    while let Some((name, parent)) = stack.pop() {
        let body = tree.body(name)?;
        let world = compose(&parent, &body.local);
        resolved.transforms.insert(name.to_owned(), world);
        resolved.order.push(name.to_owned());

        if let Some(kids) = children.get(name) {
            stack.extend(kids.iter().rev().map(|kid| (*kid, world)));
        }
    }

    if resolved.len() < tree.len() {
        let cycle = find_cycle(tree, &resolved)?;
        return Err(ResolveError::CycleDetected { cycle });
    }

    tracing::debug!(
        robot = %tree.name,
        bodies = resolved.len(),
        roots = tree.roots().count(),
        "resolved world transforms"
    );
    Ok(resolved)
}

fn compose(parent: &Isometry3<f64>, local: &Isometry3<f64>) -> Isometry3<f64> {
    let translation = parent.translation.vector + parent.rotation * local.translation.vector;
    let mut rotation = parent.rotation * local.rotation;
    rotation.renormalize();
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Walk the parent chain of the first unresolved body until it repeats.
fn find_cycle(tree: &Tree, resolved: &ResolvedTransforms) -> Result<Vec<String>, ResolveError> {
    let mut visited: HashSet<&str> = HashSet::new();

    for start in tree.bodies().filter(|b| !resolved.contains(&b.name)) {
        if visited.contains(start.name.as_str()) {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashMap<&str, usize> = HashMap::new();
        let mut current = start;

        loop {
            let name = current.name.as_str();
            if let Some(&idx) = on_path.get(name) {
                let mut cycle: Vec<String> = path[idx..].iter().map(|s| (*s).to_owned()).collect();
                if let Some(min) = (0..cycle.len()).min_by_key(|&i| &cycle[i]) {
                    cycle.rotate_left(min);
                }
                return Ok(cycle);
            }
            if !visited.insert(name) {
                break;
            }
            on_path.insert(name, path.len());
            path.push(name);

            match &current.parent {
                Some(parent) => current = tree.body(parent)?,
                None => break,
            }
        }
    }

    // Unreachable for trees built through `Tree` or `TreeBuilder`.
    Ok(tree
        .bodies()
        .filter(|b| !resolved.contains(&b.name))
        .map(|b| b.name.clone())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
