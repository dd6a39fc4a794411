//! Domain entities: node storage and dirty-report data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use generational_arena::Index;

/// Keys changed inside a single scene.
pub type SceneKeys = BTreeSet<String>;

/// Changed keys per scene name, as flushed by a node commit.
pub type DirtySceneKeys = BTreeMap<String, SceneKeys>;

/// Generation-checked handle to a node in a [`NodeTree`](crate::domain::NodeTree).
///
/// A handle outlives the node it points to: once the node is destroyed the
/// handle reads as destroyed forever, even if the slot gets reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub(crate) Index);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "{}v{}", slot, generation)
    }
}

/// Non-owning link from a node to the node it is mounted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub handle: NodeHandle,
    /// Id under which the node sits in the parent's child map
    pub key: String,
}

/// Tree node in the arena.
#[derive(Debug)]
pub(crate) struct TreeNode<S> {
    pub id: String,
    pub name: String,
    pub parent: Option<ParentLink>,
    pub children: BTreeMap<String, NodeHandle>,
    pub scenes: BTreeMap<String, S>,
    pub dirty_children: BTreeSet<String>,
    pub dirty_scenes: BTreeSet<String>,
    pub dirty_scene_keys: DirtySceneKeys,
}

impl<S> TreeNode<S> {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            parent: None,
            children: BTreeMap::new(),
            scenes: BTreeMap::new(),
            dirty_children: BTreeSet::new(),
            dirty_scenes: BTreeSet::new(),
            dirty_scene_keys: DirtySceneKeys::new(),
        }
    }

    /// True if a commit on this node would visit anything.
    pub fn is_dirty(&self) -> bool {
        !self.dirty_children.is_empty()
            || !self.dirty_scenes.is_empty()
            || !self.dirty_scene_keys.is_empty()
    }
}

/// Identity handed to a scene when it is attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneBinding {
    /// Owning node
    pub node: NodeHandle,
    /// Id of the owning node at attach time
    pub node_id: String,
    /// Scene name, unique within the owning node
    pub name: String,
}

/// One commit report delivered to an [`ArenaStore`](crate::infrastructure::ArenaStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyReport {
    pub node_id: String,
    pub scenes: DirtySceneKeys,
}

impl DirtyReport {
    pub fn new(node_id: impl Into<String>, scenes: DirtySceneKeys) -> Self {
        Self {
            node_id: node_id.into(),
            scenes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Build a [`SceneKeys`] set from anything string-like.
///
/// ```
/// let keys = scenetree::domain::scene_keys(["a", "b"]);
/// assert!(keys.contains("a"));
/// ```
pub fn scene_keys<I, K>(keys: I) -> SceneKeys
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    keys.into_iter().map(Into::into).collect()
}
