use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a node in the cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    pub id: Uuid,
    pub name: String,
    pub status: NodeStatus,
    pub addr: String,
    /// Free-form key/value labels set by the operator or the node agent.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

/// Status of a node in the cluster.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum NodeStatus {
    Ready,
    Running,
    Stopped,
}

impl Node {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Whether the node can take new pods.
    pub fn is_schedulable(&self) -> bool {
        self.status != NodeStatus::Stopped
    }
}

impl Default for Node {
    fn default() -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Node {
            id,
            name: format!("node-{}", id.simple()),
            status: NodeStatus::Ready,
            addr: "127.0.0.1:10250".to_string(),
            labels: HashMap::new(),
            started_at: now,
            last_heartbeat: now,
        }
    }
}
