//! Mutable node tree with fine-grained dirty tracking.
//!
//! A [`NodeTree`](domain::NodeTree) holds nodes that own child nodes and named
//! [`Scene`](domain::Scene)s. Changing a scene marks it dirty on its node and
//! on every ancestor's dirty-child set, so a single
//! [`commit`](domain::NodeTree::commit) from the root visits exactly the
//! changed nodes and scenes and reports their changed keys to an
//! [`ArenaStore`](infrastructure::ArenaStore).
//!
//! ```
//! use std::collections::BTreeMap;
//! use scenetree::domain::{KeyedScene, NodeTree};
//! use scenetree::infrastructure::MemoryStore;
//!
//! let mut tree: NodeTree<KeyedScene<i32>, MemoryStore> = NodeTree::new(MemoryStore::default());
//! let root = tree.create_node("root", "Root");
//! let a = tree.spawn_child(root, "a", "A").unwrap().unwrap();
//! tree.add_scene(a, "s1", BTreeMap::new).unwrap();
//! tree.modify_scene(a, "s1", |s| s.set("k", 1)).unwrap();
//!
//! tree.commit(root);
//! assert_eq!(tree.store().reports()[0].node_id, "a");
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
