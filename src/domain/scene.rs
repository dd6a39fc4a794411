//! Scene contract and a key/value reference scene.
//!
//! A scene is a named payload owned by exactly one node. The tree only sees
//! the lifecycle hooks below; everything else about a scene is private to it.

use std::collections::BTreeMap;

use tracing::{instrument, trace};

use crate::domain::entities::{SceneBinding, SceneKeys};

/// Payload attached to a node under a unique name.
pub trait Scene {
    /// Value produced by the factory passed to
    /// [`NodeTree::add_scene`](crate::domain::NodeTree::add_scene).
    type Payload;

    /// Externally visible handle of the scene's data.
    type Entity;

    /// Construct a scene bound to its owning node.
    fn new(binding: SceneBinding, payload: Self::Payload) -> Self;

    fn entity(&self) -> &Self::Entity;

    /// Flush internal pending state. Must be idempotent.
    fn commit(&mut self);

    /// Release resources. Must be idempotent.
    fn destroy(&mut self);

    /// Keys changed since the last commit, or `None` if the scene is clean.
    ///
    /// Consulted by [`NodeTree::modify_scene`](crate::domain::NodeTree::modify_scene)
    /// after each mutation; the result replaces whatever the node recorded before.
    fn pending_keys(&self) -> Option<SceneKeys>;
}

/// Scene holding string-keyed values with staged writes.
///
/// Writes go to a staging area and become visible through [`Scene::entity`]
/// only after [`Scene::commit`].
#[derive(Debug, Clone)]
pub struct KeyedScene<V> {
    binding: SceneBinding,
    committed: BTreeMap<String, V>,
    staged: BTreeMap<String, Option<V>>,
    destroyed: bool,
}

impl<V> KeyedScene<V> {
    pub fn binding(&self) -> &SceneBinding {
        &self.binding
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Stage a write. Ignored once destroyed.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if !self.destroyed {
            self.staged.insert(key.into(), Some(value));
        }
    }

    /// Stage a removal. Ignored once destroyed.
    pub fn remove(&mut self, key: impl Into<String>) {
        if !self.destroyed {
            self.staged.insert(key.into(), None);
        }
    }

    /// Read through staged state, falling back to committed values.
    pub fn get(&self, key: &str) -> Option<&V> {
        match self.staged.get(key) {
            Some(staged) => staged.as_ref(),
            None => self.committed.get(key),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.staged.is_empty()
    }
}

impl<V> Scene for KeyedScene<V> {
    type Payload = BTreeMap<String, V>;
    type Entity = BTreeMap<String, V>;

    fn new(binding: SceneBinding, payload: Self::Payload) -> Self {
        Self {
            binding,
            committed: payload,
            staged: BTreeMap::new(),
            destroyed: false,
        }
    }

    fn entity(&self) -> &Self::Entity {
        &self.committed
    }

    #[instrument(level = "trace", skip(self), fields(scene = %self.binding.name))]
    fn commit(&mut self) {
        if self.destroyed {
            return;
        }
        for (key, value) in std::mem::take(&mut self.staged) {
            match value {
                Some(value) => {
                    self.committed.insert(key, value);
                }
                None => {
                    self.committed.remove(&key);
                }
            }
        }
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            trace!(scene = %self.binding.name, node = %self.binding.node_id, "destroying scene");
            self.destroyed = true;
            self.staged.clear();
            self.committed.clear();
        }
    }

    fn pending_keys(&self) -> Option<SceneKeys> {
        if self.staged.is_empty() {
            None
        } else {
            Some(self.staged.keys().cloned().collect())
        }
    }
}
