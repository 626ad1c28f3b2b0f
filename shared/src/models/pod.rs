use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::metadata::Metadata;

// --- Core ---

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Pod {
    pub metadata: Metadata,
    pub spec: PodSpec,
    pub status: PodStatus,
}

/// Desired state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodSpec {
    /// Empty until the scheduler binds the pod.
    pub node_name: String,
    pub containers: Vec<ContainerSpec>,
}

/// Actual state
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PodStatus {
    pub phase: PodPhase,
    pub last_update: Option<DateTime<Utc>>,
    pub observed_generation: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum PodPhase {
    Pending,
    Running,
    Unknown,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
}

impl Pod {
    pub fn is_bound(&self) -> bool {
        !self.spec.node_name.is_empty()
    }
}

// --- Impl ---

impl Default for PodStatus {
    fn default() -> Self {
        PodStatus {
            phase: PodPhase::Pending,
            last_update: None,
            observed_generation: 0,
        }
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerSpec {
            name: "test-container".to_string(),
            image: "busybox:latest".to_string(),
        }
    }
}

impl Default for PodSpec {
    fn default() -> Self {
        PodSpec {
            node_name: "".to_string(),
            containers: vec![ContainerSpec::default()],
        }
    }
}
