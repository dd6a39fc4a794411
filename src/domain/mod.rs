//! Domain layer: the node tree, its scenes and dirty bookkeeping
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
mod dirty;
pub mod entities;
pub mod error;
pub mod scene;

pub use arena::NodeTree;
pub use entities::{scene_keys, DirtyReport, DirtySceneKeys, NodeHandle, SceneBinding, SceneKeys};
pub use error::{TreeError, TreeResult};
pub use scene::{KeyedScene, Scene};
