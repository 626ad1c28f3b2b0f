//! Plugin contract between the scheduling loop and the scoring plugins.
//!
//! A [`Framework`] owns the plugins enabled by the profile and a [`Handle`]
//! they share. Each cycle the controller swaps a fresh [`Snapshot`] into the
//! handle, then asks the framework to score the feasible nodes.

mod errors;
pub mod registry;
mod snapshot;
mod status;

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use shared::models::Pod;

pub use errors::FrameworkError;
pub use registry::{PluginArgs, PluginConfig, PluginFactory, Profile, Registry};
pub use snapshot::{Handle, NodeInfo, NodeInfoLister, Snapshot};
pub use status::{Code, Status};

/// Score of one node, as produced by a single plugin or summed over all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScore {
    pub name: String,
    pub score: i64,
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

/// Ranks nodes that passed filtering. Called once per node per cycle and
/// possibly from several threads at once.
pub trait ScorePlugin: Plugin {
    fn score(&self, state: &CycleState, pod: &Pod, node_name: &str) -> (i64, Status);

    /// Optional normalization step run after all nodes were scored.
    fn score_extensions(&self) -> Option<&dyn ScoreExtensions>;
}

pub trait ScoreExtensions: Send + Sync {
    fn normalize_score(&self, state: &CycleState, pod: &Pod, scores: &mut [NodeScore]) -> Status;
}

/// Per-attempt scratch space shared between plugins.
#[derive(Default)]
pub struct CycleState {
    storage: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.storage.insert(key.to_string(), Arc::new(value));
    }

    /// Returns `None` if the key is absent or holds another type.
    pub fn read<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.storage.get(key)?.clone();
        value.downcast::<T>().ok()
    }

    pub fn delete(&self, key: &str) {
        self.storage.remove(key);
    }
}

/// A score plugin enabled in the profile, with its weight.
pub struct WeightedPlugin {
    pub plugin: Box<dyn ScorePlugin>,
    pub weight: i64,
}

pub struct Framework {
    handle: Handle,
    plugins: Vec<WeightedPlugin>,
}

impl Framework {
    /// Builds every plugin listed in `profile` from `registry`.
    pub fn new(registry: &Registry, profile: &Profile) -> Result<Self, FrameworkError> {
        let handle = Handle::default();
        let plugins = registry.build(profile, &handle)?;
        Ok(Self { handle, plugins })
    }

    pub fn with_plugins(handle: Handle, plugins: Vec<WeightedPlugin>) -> Self {
        Self { handle, plugins }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.plugin.name()).collect()
    }

    /// Runs every score plugin over `nodes` and returns the weighted sum per
    /// node, in the order of `nodes`.
    ///
    /// The first non-success status aborts scoring for this pod.
    pub fn run_score_plugins(
        &self,
        state: &CycleState,
        pod: &Pod,
        nodes: &[NodeInfo],
    ) -> Result<Vec<NodeScore>, Status> {
        let mut totals: Vec<NodeScore> = nodes
            .iter()
            .map(|info| NodeScore {
                name: info.node().name.clone(),
                score: 0,
            })
            .collect();

        for weighted in &self.plugins {
            let name = weighted.plugin.name();
            let mut scores = Vec::with_capacity(nodes.len());
            for info in nodes {
                let node_name = &info.node().name;
                let (score, status) = weighted.plugin.score(state, pod, node_name);
                if !status.is_success() {
                    return Err(status.with_plugin(name));
                }
                scores.push(NodeScore {
                    name: node_name.clone(),
                    score,
                });
            }

            if let Some(ext) = weighted.plugin.score_extensions() {
                let status = ext.normalize_score(state, pod, &mut scores);
                if !status.is_success() {
                    return Err(status.with_plugin(name));
                }
            }

            for (total, scored) in totals.iter_mut().zip(&scores) {
                total.score = total
                    .score
                    .saturating_add(scored.score.saturating_mul(weighted.weight));
            }
        }

        Ok(totals)
    }
}
