//! Arena-based node tree.
//!
//! Every node lives in one [`generational_arena::Arena`] owned by the
//! [`NodeTree`]. Children are referenced by [`NodeHandle`], parents by a
//! non-owning [`ParentLink`]. Destroying a node frees its slot, after which
//! the generation check makes every outstanding handle read as destroyed.
//!
//! Operations on a destroyed handle never fail: they return `Ok(None)`,
//! `None`, `false` or an empty result.

use generational_arena::Arena;
use tracing::{debug, instrument, trace};

use crate::config::Settings;
use crate::domain::entities::{DirtySceneKeys, NodeHandle, ParentLink, SceneBinding, TreeNode};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::scene::Scene;
use crate::infrastructure::ArenaStore;

/// Mutable node tree reporting commits to an [`ArenaStore`].
#[derive(Debug)]
pub struct NodeTree<S, A> {
    pub(crate) arena: Arena<TreeNode<S>>,
    pub(crate) store: A,
    pub(crate) settings: Settings,
}

impl<S, A> NodeTree<S, A> {
    pub fn new(store: A) -> Self {
        Self::with_settings(store, Settings::default())
    }

    pub fn with_settings(store: A, settings: Settings) -> Self {
        Self {
            arena: Arena::with_capacity(settings.arena_capacity),
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut A {
        &mut self.store
    }

    /// Number of live nodes, mounted or detached.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Create a detached node: a root, or a node waiting to be mounted.
    #[instrument(level = "trace", skip(self))]
    pub fn create_node(&mut self, id: &str, name: &str) -> NodeHandle {
        let handle = NodeHandle(
            self.arena
                .insert(TreeNode::new(id.to_string(), name.to_string())),
        );
        debug!(%handle, id, "node created");
        handle
    }

    pub(crate) fn node(&self, handle: NodeHandle) -> Option<&TreeNode<S>> {
        self.arena.get(handle.0)
    }

    pub fn is_destroyed(&self, handle: NodeHandle) -> bool {
        !self.arena.contains(handle.0)
    }

    pub fn node_id(&self, handle: NodeHandle) -> Option<&str> {
        self.node(handle).map(|n| n.id.as_str())
    }

    pub fn node_name(&self, handle: NodeHandle) -> Option<&str> {
        self.node(handle).map(|n| n.name.as_str())
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.node(handle)?.parent.as_ref().map(|link| link.handle)
    }

    pub fn child(&self, handle: NodeHandle, id: &str) -> Option<NodeHandle> {
        self.node(handle)?.children.get(id).copied()
    }

    /// Mounted children in id order. Empty for a destroyed node.
    pub fn children(&self, handle: NodeHandle) -> impl Iterator<Item = (&str, NodeHandle)> + '_ {
        self.node(handle)
            .into_iter()
            .flat_map(|n| n.children.iter().map(|(id, child)| (id.as_str(), *child)))
    }

    /// Always `false` once the node is destroyed.
    pub fn has_child(&self, handle: NodeHandle, id: &str) -> bool {
        self.node(handle)
            .is_some_and(|n| n.children.contains_key(id))
    }

    pub fn scene(&self, handle: NodeHandle, name: &str) -> Option<&S> {
        self.node(handle)?.scenes.get(name)
    }

    pub fn scene_names(&self, handle: NodeHandle) -> impl Iterator<Item = &str> + '_ {
        self.node(handle)
            .into_iter()
            .flat_map(|n| n.scenes.keys().map(String::as_str))
    }

    /// True if the next commit on this node has anything to visit or report.
    pub fn is_dirty(&self, handle: NodeHandle) -> bool {
        self.node(handle).is_some_and(TreeNode::is_dirty)
    }

    pub fn dirty_children(&self, handle: NodeHandle) -> impl Iterator<Item = &str> + '_ {
        self.node(handle)
            .into_iter()
            .flat_map(|n| n.dirty_children.iter().map(String::as_str))
    }

    pub fn dirty_scenes(&self, handle: NodeHandle) -> impl Iterator<Item = &str> + '_ {
        self.node(handle)
            .into_iter()
            .flat_map(|n| n.dirty_scenes.iter().map(String::as_str))
    }

    pub fn dirty_scene_keys(&self, handle: NodeHandle) -> Option<&DirtySceneKeys> {
        self.node(handle).map(|n| &n.dirty_scene_keys)
    }

    /// True if `ancestor` is `handle` itself or sits above it.
    fn is_ancestor_or_self(&self, ancestor: NodeHandle, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            current = self.parent(h);
        }
        false
    }
}

impl<S: Scene, A: ArenaStore> NodeTree<S, A> {
    /// Attach a new scene built from `factory`'s payload.
    ///
    /// The factory is not called on a destroyed node.
    #[instrument(level = "trace", skip(self, factory))]
    pub fn add_scene<F>(
        &mut self,
        handle: NodeHandle,
        name: &str,
        factory: F,
    ) -> TreeResult<Option<&mut S>>
    where
        F: FnOnce() -> S::Payload,
    {
        let Some(node) = self.arena.get_mut(handle.0) else {
            trace!("add_scene on destroyed node ignored");
            return Ok(None);
        };
        if node.scenes.contains_key(name) {
            return Err(TreeError::DuplicateScene {
                node: node.id.clone(),
                scene: name.to_string(),
            });
        }

        let binding = SceneBinding {
            node: handle,
            node_id: node.id.clone(),
            name: name.to_string(),
        };
        let scene = S::new(binding, factory());
        debug!(node = %node.id, scene = name, "scene added");
        Ok(Some(node.scenes.entry(name.to_string()).or_insert(scene)))
    }

    /// Destroy and detach a scene, handing it back to the caller.
    ///
    /// Pending dirty state for the scene is dropped with it.
    #[instrument(level = "trace", skip(self))]
    pub fn delete_scene(&mut self, handle: NodeHandle, name: &str) -> TreeResult<Option<S>> {
        let Some(node) = self.arena.get_mut(handle.0) else {
            trace!("delete_scene on destroyed node ignored");
            return Ok(None);
        };
        let Some(mut scene) = node.scenes.remove(name) else {
            return Err(TreeError::SceneNotFound {
                node: node.id.clone(),
                scene: name.to_string(),
            });
        };

        scene.destroy();
        node.dirty_scenes.remove(name);
        node.dirty_scene_keys.remove(name);
        debug!(node = %node.id, scene = name, "scene deleted");
        Ok(Some(scene))
    }

    /// Externally visible payload of a scene.
    #[instrument(level = "trace", skip(self))]
    pub fn get_scene_entity(&self, handle: NodeHandle, name: &str) -> TreeResult<Option<&S::Entity>> {
        let Some(node) = self.node(handle) else {
            return Ok(None);
        };
        match node.scenes.get(name) {
            Some(scene) => Ok(Some(scene.entity())),
            None => Err(TreeError::SceneNotFound {
                node: node.id.clone(),
                scene: name.to_string(),
            }),
        }
    }

    /// Mount a detached node under `handle` as child `id`.
    ///
    /// A child that already carries dirty state makes the new ancestor chain
    /// dirty, so the next commit from any ancestor reaches it.
    #[instrument(level = "trace", skip(self))]
    pub fn mount_child(
        &mut self,
        handle: NodeHandle,
        id: &str,
        child: NodeHandle,
    ) -> TreeResult<Option<NodeHandle>> {
        let Some(node) = self.node(handle) else {
            trace!("mount_child on destroyed node ignored");
            return Ok(None);
        };
        let node_id = node.id.clone();
        let child_id = id.to_string();

        if node.children.contains_key(id) {
            return Err(TreeError::DuplicateChild {
                node: node_id,
                child: child_id,
            });
        }
        let Some(child_node) = self.node(child) else {
            return Err(TreeError::DestroyedChild {
                node: node_id,
                child: child_id,
            });
        };
        if child_node.parent.is_some() {
            return Err(TreeError::AlreadyMounted {
                node: node_id,
                child: child_id,
            });
        }
        if self.is_ancestor_or_self(child, handle) {
            return Err(TreeError::CycleDetected {
                node: node_id,
                child: child_id,
            });
        }
        let child_dirty = child_node.is_dirty();

        if let Some(child_node) = self.arena.get_mut(child.0) {
            child_node.parent = Some(ParentLink {
                handle,
                key: child_id.clone(),
            });
        }
        if let Some(node) = self.arena.get_mut(handle.0) {
            node.children.insert(child_id, child);
        }
        debug!(node = %node_id, child = id, "child mounted");

        if child_dirty {
            self.mark_child_dirty(handle, id);
        }
        Ok(Some(child))
    }

    /// Detach child `id`. The caller owns the returned node from here on.
    #[instrument(level = "trace", skip(self))]
    pub fn unmount_child(&mut self, handle: NodeHandle, id: &str) -> TreeResult<Option<NodeHandle>> {
        let Some(node) = self.arena.get_mut(handle.0) else {
            trace!("unmount_child on destroyed node ignored");
            return Ok(None);
        };
        let Some(child) = node.children.remove(id) else {
            return Err(TreeError::ChildNotFound {
                node: node.id.clone(),
                child: id.to_string(),
            });
        };
        node.dirty_children.remove(id);
        debug!(node = %node.id, child = id, "child unmounted");

        if let Some(child_node) = self.arena.get_mut(child.0) {
            child_node.parent = None;
        }
        Ok(Some(child))
    }

    /// Create a node and mount it under `handle` with the same id.
    #[instrument(level = "trace", skip(self))]
    pub fn spawn_child(&mut self, handle: NodeHandle, id: &str, name: &str) -> TreeResult<Option<NodeHandle>> {
        let Some(node) = self.node(handle) else {
            return Ok(None);
        };
        if node.children.contains_key(id) {
            return Err(TreeError::DuplicateChild {
                node: node.id.clone(),
                child: id.to_string(),
            });
        }

        let child = self.create_node(id, name);
        match self.mount_child(handle, id, child) {
            Ok(mounted) => Ok(mounted),
            Err(e) => {
                self.arena.remove(child.0);
                Err(e)
            }
        }
    }

    /// Unmount child `id` and destroy it.
    ///
    /// Returns the child's own id followed by every id its cascade destroyed.
    /// A child that was already destroyed through its own handle only has its
    /// stale entry dropped, and the list is empty.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, handle: NodeHandle, id: &str) -> TreeResult<Option<Vec<String>>> {
        let Some(child) = self.unmount_child(handle, id)? else {
            return Ok(None);
        };
        if self.is_destroyed(child) {
            debug!(child = id, "removed entry for an already destroyed child");
            return Ok(Some(Vec::new()));
        }
        let mut destroyed = vec![id.to_string()];
        destroyed.extend(self.destroy(child));
        Ok(Some(destroyed))
    }

    /// Transaction manager of the store, while the node is live.
    pub fn trans_manager(&self, handle: NodeHandle) -> Option<&A::TransManager> {
        self.node(handle).map(|_| self.store.trans_manager())
    }

    /// Destroy a node with all of its scenes and descendants.
    ///
    /// Returns the ids of the node's children plus everything each child's
    /// cascade returned. The node's own id is not included: it belongs to
    /// whoever holds the node (its parent, or the caller for a root).
    /// The parent is not notified; a second call returns an empty list.
    #[instrument(level = "trace", skip(self))]
    pub fn destroy(&mut self, handle: NodeHandle) -> Vec<String> {
        let Some(mut node) = self.arena.remove(handle.0) else {
            trace!("node already destroyed");
            return Vec::new();
        };
        debug!(node = %node.id, children = node.children.len(), "destroying node");

        for scene in node.scenes.values_mut() {
            scene.destroy();
        }
        let mut destroyed: Vec<String> = node.children.keys().cloned().collect();
        for child in node.children.into_values() {
            destroyed.extend(self.destroy(child));
        }
        destroyed
    }
}
