use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeHandle, NodeTree};

/// Render a subtree as a [`termtree::Tree`] for debugging output.
pub trait TreeNodeConvert {
    fn to_tree_string(&self, root: NodeHandle) -> Tree<String>;
}

impl<S, A> TreeNodeConvert for NodeTree<S, A> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, root: NodeHandle) -> Tree<String> {
        if self.is_destroyed(root) {
            return Tree::new("Destroyed node".to_string());
        }

        let mut tree = Tree::new(label(self, root));
        for (_, child) in self.children(root) {
            tree.push(self.to_tree_string(child));
        }
        tree
    }
}

// id (name) [scenes] *dirty-scenes
fn label<S, A>(tree: &NodeTree<S, A>, handle: NodeHandle) -> String {
    let mut label = format!(
        "{} ({})",
        tree.node_id(handle).unwrap_or_default(),
        tree.node_name(handle).unwrap_or_default()
    );
    let scenes = tree.scene_names(handle).join(", ");
    if !scenes.is_empty() {
        label.push_str(&format!(" [{}]", scenes));
    }
    let dirty = tree.dirty_scenes(handle).join(", ");
    if !dirty.is_empty() {
        label.push_str(&format!(" *{}", dirty));
    }
    label
}
