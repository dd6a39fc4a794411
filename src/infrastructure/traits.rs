//! Store boundary traits
//!
//! The arena store is the sink for flushed dirty information and the owner of
//! the transaction manager. Trees talk to it only through [`ArenaStore`], so
//! callers can plug in their own aggregation and tests can inspect reports.

use tracing::debug;

use crate::domain::{DirtyReport, DirtySceneKeys};

/// Root-level aggregator a tree reports commits to.
pub trait ArenaStore {
    /// Shared transaction manager handed out to nodes.
    type TransManager;

    /// Receive the dirty scene keys flushed by one node commit.
    fn update_dirty_node(&mut self, node_id: &str, dirty: DirtySceneKeys);

    fn trans_manager(&self) -> &Self::TransManager;
}

/// In-memory store that keeps every report in arrival order.
#[derive(Debug, Default)]
pub struct MemoryStore<T = ()> {
    reports: Vec<DirtyReport>,
    trans_manager: T,
}

impl<T> MemoryStore<T> {
    pub fn new(trans_manager: T) -> Self {
        Self {
            reports: Vec::new(),
            trans_manager,
        }
    }

    pub fn reports(&self) -> &[DirtyReport] {
        &self.reports
    }

    /// Reports delivered for `node_id`, oldest first.
    pub fn reports_for<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a DirtyReport> + 'a {
        self.reports.iter().filter(move |r| r.node_id == node_id)
    }

    /// Drain all reports collected so far.
    pub fn take_reports(&mut self) -> Vec<DirtyReport> {
        std::mem::take(&mut self.reports)
    }
}

impl<T> ArenaStore for MemoryStore<T> {
    type TransManager = T;

    fn update_dirty_node(&mut self, node_id: &str, dirty: DirtySceneKeys) {
        debug!(node = node_id, scenes = dirty.len(), "dirty node reported");
        self.reports.push(DirtyReport::new(node_id, dirty));
    }

    fn trans_manager(&self) -> &Self::TransManager {
        &self.trans_manager
    }
}
