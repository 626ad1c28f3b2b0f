use std::sync::Arc;

use reqwest::Client;
use shared::{api::PodPatch, models::Pod};

use crate::framework::{CycleState, Framework, NodeInfo, NodeScore, Status};

use super::{filter::FilterOptions, state::State};

/// Scheduling flow for a single pod: snapshots the cluster, filters
/// candidate nodes, scores them, and binds the pod if a node is chosen
pub struct SchedulerFlow {
    state: State,
    framework: Arc<Framework>,
    client: Client,
    pod: Pod,
    candidates: Vec<NodeInfo>,
    pub scores: Vec<NodeScore>,
    pub chosen: Option<String>,
    pub status: Status,
    pub accepted: bool,
    filter_option: FilterOptions,
}

impl SchedulerFlow {
    pub fn new(
        state: &State,
        framework: &Arc<Framework>,
        client: &Client,
        pod: Pod,
        filter_option: Option<FilterOptions>,
    ) -> Self {
        Self {
            state: state.clone(),
            framework: framework.clone(),
            client: client.clone(),
            pod,
            candidates: Vec::new(),
            scores: Vec::new(),
            chosen: None,
            status: Status::success(),
            accepted: false,
            filter_option: filter_option.unwrap_or(FilterOptions::Basic),
        }
    }

    pub async fn execute(self) -> Self {
        self.snapshot().filter().score().bind().await
    }

    /// Publish the current nodes to the plugins through the shared handle.
    fn snapshot(self) -> Self {
        let snapshot = self.state.snapshot();
        tracing::debug!(pod=%self.pod.metadata.name, nodes=snapshot.len(), "Snapshot taken");
        self.framework.handle().update_snapshot(Arc::new(snapshot));
        self
    }

    /// Apply the filter to generate an initial set of candidate nodes.
    fn filter(mut self) -> Self {
        let lister = self.framework.handle().snapshot_shared_lister();
        self.candidates = self.filter_option.filter(lister.as_ref(), &self.pod);
        if self.candidates.is_empty() {
            self.status = Status::unschedulable("no schedulable nodes");
        }
        self
    }

    /// Score candidate nodes and pick the best one (if any).
    /// Ties go to the lexicographically smallest node name.
    fn score(mut self) -> Self {
        if self.candidates.is_empty() {
            return self;
        }

        let cycle_state = CycleState::new();
        match self
            .framework
            .run_score_plugins(&cycle_state, &self.pod, &self.candidates)
        {
            Ok(scores) => {
                self.chosen = scores
                    .iter()
                    .max_by(|a, b| a.score.cmp(&b.score).then_with(|| b.name.cmp(&a.name)))
                    .map(|best| best.name.clone());
                self.scores = scores;
            }
            Err(status) => {
                tracing::warn!(pod=%self.pod.metadata.name, %status, "Scoring failed");
                self.status = status;
            }
        }
        self
    }

    /// Bind the pod to the chosen node by patching the API server.
    async fn bind(mut self) -> Self {
        let Some(ref node) = self.chosen else {
            return self;
        };

        let url = format!("{}/{}", self.state.pods_uri, self.pod.metadata.name);

        match self.client.patch(&url).json(&PodPatch::bind(node)).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(
                    pod=%self.pod.metadata.name,
                    %node,
                    "Scheduled"
                );
                self.accepted = true;
            }
            Ok(resp) => {
                tracing::error!(
                    status = %resp.status(),
                    "Failed to patch pod: non-success response"
                );
            }
            Err(err) => {
                tracing::error!("Failed to patch pod: {}", err);
            }
        }
        self
    }
}
