//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Structural errors raised by live nodes.
///
/// Destroyed nodes never raise: the matching operations return `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("scene [{scene}] already exists in node [{node}]")]
    DuplicateScene { node: String, scene: String },

    #[error("scene [{scene}] does not exist in node [{node}]")]
    SceneNotFound { node: String, scene: String },

    #[error("child [{child}] already mounted in node [{node}]")]
    DuplicateChild { node: String, child: String },

    #[error("child [{child}] does not exist in node [{node}]")]
    ChildNotFound { node: String, child: String },

    #[error("node [{child}] is already mounted elsewhere, cannot mount into [{node}]")]
    AlreadyMounted { node: String, child: String },

    #[error("mounting [{child}] into [{node}] would create a cycle")]
    CycleDetected { node: String, child: String },

    #[error("cannot mount destroyed node as [{child}] into [{node}]")]
    DestroyedChild { node: String, child: String },
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
