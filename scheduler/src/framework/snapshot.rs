//! Read-only view of the cluster handed to plugins during a scheduling cycle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use shared::models::Node;

use super::errors::FrameworkError;

/// Scheduler-side wrapper around one node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    node: Node,
}

impl NodeInfo {
    pub fn new(node: Node) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }
}

/// Node lookups served to plugins.
pub trait NodeInfoLister: Send + Sync {
    fn get(&self, node_name: &str) -> Result<NodeInfo, FrameworkError>;
    fn list(&self) -> Vec<NodeInfo>;
}

/// Point-in-time copy of the known nodes, taken at the start of a cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    node_infos: HashMap<String, NodeInfo>,
}

impl Snapshot {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        let node_infos = nodes
            .into_iter()
            .map(|node| (node.name.clone(), NodeInfo::new(node)))
            .collect();
        Self { node_infos }
    }

    pub fn len(&self) -> usize {
        self.node_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_infos.is_empty()
    }
}

impl NodeInfoLister for Snapshot {
    fn get(&self, node_name: &str) -> Result<NodeInfo, FrameworkError> {
        self.node_infos
            .get(node_name)
            .cloned()
            .ok_or_else(|| FrameworkError::NodeNotFound(node_name.to_string()))
    }

    fn list(&self) -> Vec<NodeInfo> {
        let mut infos: Vec<NodeInfo> = self.node_infos.values().cloned().collect();
        infos.sort_by(|a, b| a.node.name.cmp(&b.node.name));
        infos
    }
}

/// Gives plugins access to framework-owned data.
///
/// Clones share the same lister, so swapping the snapshot through one handle
/// is visible to every plugin built with it.
#[derive(Clone)]
pub struct Handle {
    lister: Arc<RwLock<Arc<dyn NodeInfoLister>>>,
}

impl Handle {
    pub fn new(lister: Arc<dyn NodeInfoLister>) -> Self {
        Self {
            lister: Arc::new(RwLock::new(lister)),
        }
    }

    pub fn snapshot_shared_lister(&self) -> Arc<dyn NodeInfoLister> {
        self.lister
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_snapshot(&self, lister: Arc<dyn NodeInfoLister>) {
        *self.lister.write().unwrap_or_else(PoisonError::into_inner) = lister;
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new(Arc::new(Snapshot::default()))
    }
}
