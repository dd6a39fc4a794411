#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use scenetree::domain::{NodeTree, Scene, SceneBinding, SceneKeys};
use scenetree::infrastructure::MemoryStore;
use scenetree::util::testing;

/// Shared event log written by every [`ProbeScene`].
pub type Log = Rc<RefCell<Vec<String>>>;

/// Scene that logs its lifecycle hooks and reports whatever keys a test sets.
#[derive(Debug)]
pub struct ProbeScene {
    pub label: String,
    pub log: Log,
    pub pending: Option<SceneKeys>,
}

impl Scene for ProbeScene {
    type Payload = Log;
    type Entity = String;

    fn new(binding: SceneBinding, payload: Self::Payload) -> Self {
        Self {
            label: format!("{}/{}", binding.node_id, binding.name),
            log: payload,
            pending: None,
        }
    }

    fn entity(&self) -> &Self::Entity {
        &self.label
    }

    fn commit(&mut self) {
        self.log.borrow_mut().push(format!("commit {}", self.label));
        self.pending = None;
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().push(format!("destroy {}", self.label));
    }

    fn pending_keys(&self) -> Option<SceneKeys> {
        self.pending.clone()
    }
}

pub type ProbeTree = NodeTree<ProbeScene, MemoryStore<&'static str>>;

pub fn probe_tree() -> (ProbeTree, Log) {
    testing::init_test_setup();
    (NodeTree::new(MemoryStore::new("trans-manager")), Log::default())
}
