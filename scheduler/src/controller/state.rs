use dashmap::{DashMap, DashSet};
use shared::models::{Node, Pod};
use std::sync::Arc;
use uuid::Uuid;

use crate::framework::Snapshot;

pub type State = Arc<SchedulerState>;

/// In-memory scheduler state shared across tasks.
#[derive(Debug)]
pub struct SchedulerState {
    pub nodes: DashMap<String, Node>,
    pub pods: DashMap<Uuid, Pod>,
    /// Node name to pod ids, `""` holds the pods still waiting for a node.
    pub pod_map: DashMap<String, DashSet<Uuid>>,

    pub pods_uri: String,
}

impl SchedulerState {
    pub fn new(apiserver: &str) -> State {
        Arc::new(Self {
            nodes: DashMap::new(),
            pods: DashMap::new(),
            pod_map: DashMap::new(),
            pods_uri: format!("{}/pods", apiserver),
        })
    }

    pub fn add_pod(&self, pod: &Pod) {
        self.pods.insert(pod.metadata.id, pod.clone());
        self.pod_map
            .entry(pod.spec.node_name.clone())
            .or_insert_with(DashSet::new)
            .insert(pod.metadata.id);
    }

    pub fn delete_pod(&self, id: &Uuid) {
        if let Some((_, pod)) = self.pods.remove(id) {
            if let Some(set) = self.pod_map.get(&pod.spec.node_name) {
                set.remove(id);
            }
        } else {
            tracing::warn!(%id, "Failed to delete pod");
        }
    }

    pub fn add_node(&self, node: &Node) {
        self.nodes.insert(node.name.clone(), node.clone());
    }

    pub fn delete_node(&self, name: &str) {
        if self.nodes.remove(name).is_none() {
            tracing::warn!(node=%name, "Failed to delete node");
        }
    }

    /// Moves a pod from its current bucket to `node`.
    pub fn assign_pod(&self, id: &Uuid, node: &str) {
        let Some(mut pod) = self.pods.get_mut(id) else {
            return;
        };
        if let Some(set) = self.pod_map.get(&pod.spec.node_name) {
            set.remove(id);
        }
        pod.spec.node_name = node.to_string();
        drop(pod);

        self.pod_map.entry(node.to_string()).or_insert_with(DashSet::new).insert(*id);
    }

    pub fn unscheduled(&self) -> Vec<Uuid> {
        self.pod_map
            .get("")
            .map(|set| set.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// Copies the known nodes into an immutable snapshot for one cycle.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.nodes.iter().map(|entry| entry.value().clone()))
    }
}
