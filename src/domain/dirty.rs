//! Dirty propagation and commit.
//!
//! Dirtiness always starts at a scene. Marking a scene dirty records it on
//! its node, then every ancestor records the child through which the mark
//! arrived, up to the root. A commit walks only those recorded paths.

use tracing::{debug, instrument, trace, warn};

use crate::domain::arena::NodeTree;
use crate::domain::entities::{NodeHandle, SceneKeys, TreeNode};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::scene::Scene;
use crate::infrastructure::ArenaStore;

impl<S: Scene, A: ArenaStore> NodeTree<S, A> {
    /// Announce that scene `name` has pending changes.
    #[instrument(level = "trace", skip(self))]
    pub fn mark_scene_dirty(&mut self, handle: NodeHandle, name: &str) {
        let Some(node) = self.arena.get_mut(handle.0) else {
            return;
        };
        if !node.scenes.contains_key(name) {
            warn!(node = %node.id, scene = name, "dirty mark for unknown scene ignored");
            return;
        }
        node.dirty_scenes.insert(name.to_string());

        if let Some(link) = node.parent.clone() {
            self.mark_child_dirty(link.handle, &link.key);
        }
    }

    /// Record child `child_id` as dirty here and in every ancestor above.
    #[instrument(level = "trace", skip(self))]
    pub fn mark_child_dirty(&mut self, handle: NodeHandle, child_id: &str) {
        let mut pending = Some((handle, child_id.to_string()));
        while let Some((handle, child_id)) = pending.take() {
            let Some(node) = self.arena.get_mut(handle.0) else {
                return;
            };
            if !node.children.contains_key(&child_id) {
                warn!(node = %node.id, child = %child_id, "dirty mark for unknown child ignored");
                return;
            }
            node.dirty_children.insert(child_id);
            pending = node
                .parent
                .as_ref()
                .map(|link| (link.handle, link.key.clone()));
        }
    }

    /// Replace the remembered changed keys of scene `name`.
    #[instrument(level = "trace", skip(self))]
    pub fn record_dirty_scene_keys(&mut self, handle: NodeHandle, name: &str, keys: SceneKeys) {
        let Some(node) = self.arena.get_mut(handle.0) else {
            return;
        };
        if !node.scenes.contains_key(name) {
            warn!(node = %node.id, scene = name, "dirty keys for unknown scene ignored");
            return;
        }
        node.dirty_scene_keys.insert(name.to_string(), keys);
    }

    /// Mutate scene `name` and pick up whatever it now reports as pending.
    ///
    /// If the scene has pending keys afterwards, they replace the node's
    /// record for the scene and the scene is marked dirty. If it has none,
    /// any keys recorded earlier for the scene are dropped.
    #[instrument(level = "trace", skip(self, f))]
    pub fn modify_scene<F, R>(&mut self, handle: NodeHandle, name: &str, f: F) -> TreeResult<Option<R>>
    where
        F: FnOnce(&mut S) -> R,
    {
        let Some(node) = self.arena.get_mut(handle.0) else {
            return Ok(None);
        };
        let Some(scene) = node.scenes.get_mut(name) else {
            return Err(TreeError::SceneNotFound {
                node: node.id.clone(),
                scene: name.to_string(),
            });
        };

        let out = f(scene);
        let pending = scene.pending_keys();
        match pending {
            Some(keys) => {
                self.record_dirty_scene_keys(handle, name, keys);
                self.mark_scene_dirty(handle, name);
            }
            None => {
                // the scene flushed itself; earlier keys are stale
                node.dirty_scene_keys.remove(name);
            }
        }
        Ok(Some(out))
    }

    /// Flush every dirty child and scene below `handle`, then report.
    ///
    /// Children are committed first, then this node's dirty scenes. Only
    /// after that is the node's bookkeeping cleared and its captured dirty
    /// keys handed to the store, so marks raised while children or scenes
    /// were being visited are dropped until the next cycle.
    #[instrument(level = "trace", skip(self))]
    pub fn commit(&mut self, handle: NodeHandle) {
        let Some(node) = self.arena.get(handle.0) else {
            trace!("commit on destroyed node ignored");
            return;
        };
        let dirty_children: Vec<NodeHandle> = node
            .dirty_children
            .iter()
            .filter_map(|id| node.children.get(id).copied())
            .collect();

        for child in dirty_children {
            self.commit(child);
        }

        let Some(node) = self.arena.get_mut(handle.0) else {
            return;
        };
        let TreeNode {
            scenes,
            dirty_scenes,
            ..
        } = &mut *node;
        for name in dirty_scenes.iter() {
            if let Some(scene) = scenes.get_mut(name) {
                scene.commit();
            }
        }

        let dirty = std::mem::take(&mut node.dirty_scene_keys);
        node.dirty_children.clear();
        node.dirty_scenes.clear();
        let node_id = node.id.clone();

        if dirty.is_empty() && !self.settings.report_clean_commits {
            trace!(node = %node_id, "clean commit not reported");
            return;
        }
        debug!(node = %node_id, scenes = dirty.len(), "node committed");
        self.store.update_dirty_node(&node_id, dirty);
    }
}
