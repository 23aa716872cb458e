//! Error type for transform resolution.

use retarget_model::ModelError;

/// Errors that can occur while resolving world transforms.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Parent links form a loop; no member is reachable from a root.
    #[error("parent cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// The tree itself is inconsistent.
    #[error(transparent)]
    Model(#[from] ModelError),
}
