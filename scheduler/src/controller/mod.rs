//! Watches the apiserver for nodes and unscheduled pods and places each pod
//! on the node the score plugins rank highest.

mod filter;
mod flow;
mod state;

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::api::{EventType, NodeEvent, PodEvent};
use shared::utils::watch_stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::framework::Framework;

pub use filter::FilterOptions;
pub use flow::SchedulerFlow;
pub use state::{SchedulerState, State};

pub struct Scheduler {
    state: State,
    framework: Arc<Framework>,
    client: Client,
    tx: mpsc::Sender<Uuid>,
    pods_uri: String,
    nodes_uri: String,
}

impl Scheduler {
    fn new(apiserver: String, framework: Framework) -> (Arc<Self>, mpsc::Receiver<Uuid>) {
        let (tx, rx) = mpsc::channel::<Uuid>(100);
        (
            Arc::new(Self {
                state: SchedulerState::new(&apiserver),
                framework: Arc::new(framework),
                client: Client::new(),
                tx,
                pods_uri: format!("{}/pods?watch=true", apiserver),
                nodes_uri: format!("{}/nodes?watch=true", apiserver),
            }),
            rx,
        )
    }

    /// One task watches nodes, another pods, a third drains the queue and
    /// schedules pods one at a time.
    pub async fn run(apiserver: String, framework: Framework) {
        tracing::debug!(plugins=?framework.plugin_names(), "Running");
        let (sched, mut rx) = Scheduler::new(apiserver, framework);

        let _ = tokio::try_join!(
            // Watch nodes
            {
                let sched = sched.clone();
                tokio::spawn(async move {
                    let handler = sched.clone();
                    sched
                        .watch::<NodeEvent, _>(&sched.nodes_uri, move |event| {
                            handler.handle_node_event(event)
                        })
                        .await;
                })
            },
            // Watch pods
            {
                let sched = sched.clone();
                tokio::spawn(async move {
                    let handler = sched.clone();
                    sched
                        .watch::<PodEvent, _>(&sched.pods_uri, move |event| {
                            handler.handle_pod_event(event)
                        })
                        .await;
                })
            },
            // Pull jobs and schedule pods
            {
                let sched = sched.clone();
                tokio::spawn(async move {
                    while let Some(pod_id) = rx.recv().await {
                        sched.schedule(pod_id).await;
                    }
                })
            }
        );
    }

    async fn watch<T, F>(&self, url: &str, handle_event: F)
    where
        T: DeserializeOwned,
        F: FnMut(T) + Send + 'static,
    {
        if let Err(err) = watch_stream(&self.client, url, handle_event).await {
            tracing::error!(%url, error=%err, "Watch failed");
        }
    }

    async fn schedule(&self, id: Uuid) {
        let pod = match self.state.pods.get(&id) {
            Some(p) => p.clone(),
            None => {
                tracing::warn!(%id, "Pod not found in state");
                return;
            }
        };
        if pod.is_bound() {
            return;
        }

        let flow = SchedulerFlow::new(&self.state, &self.framework, &self.client, pod, None)
            .execute()
            .await;

        if let (true, Some(node)) = (flow.accepted, &flow.chosen) {
            self.state.assign_pod(&id, node);
        } else {
            tracing::warn!(%id, status=%flow.status, "Could not schedule pod");
        }
    }

    fn handle_pod_event(&self, event: PodEvent) {
        let pod = event.pod;
        match event.event_type {
            EventType::Added => {
                if !pod.is_bound() {
                    self.state.add_pod(&pod);
                    if let Err(err) = self.tx.try_send(pod.metadata.id) {
                        tracing::warn!(id=%pod.metadata.id, error=%err, "Queue rejected pod, waiting for next node event");
                    }
                }
            }
            EventType::Deleted => self.state.delete_pod(&pod.metadata.id),
            // Bound elsewhere, stop tracking it
            EventType::Modified if pod.is_bound() && self.state.pods.contains_key(&pod.metadata.id) => {
                self.state.delete_pod(&pod.metadata.id)
            }
            EventType::Modified => {}
        }
    }

    fn handle_node_event(&self, event: NodeEvent) {
        match event.event_type {
            EventType::Added | EventType::Modified => {
                self.state.add_node(&event.node);
                // Pods created before any node fit get another chance
                for pod_id in self.state.unscheduled() {
                    if let Err(err) = self.tx.try_send(pod_id) {
                        tracing::debug!(%pod_id, error=%err, "Requeue skipped");
                    }
                }
            }
            EventType::Deleted => self.state.delete_node(&event.node.name),
        }
    }
}

#[cfg(test)]
mod tests {

    //! - test_handle_pod_event_schedule_pod
    //!     ensures a pod is inserted and scheduled upon receiving a pod event.
    //! - test_handle_node_event_schedule_unscheduled_pods
    //!     verifies that unscheduled pods are scheduled when a node is added.

    use super::*;
    use crate::framework::{Profile, Registry};
    use crate::plugins::energyscore::ENERGY_SCORE_LABEL;
    use shared::models::{node::Node, pod::Pod};
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn start_mock_server() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path_regex(r"^/pods/.*$"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        server
    }

    fn scheduler(server: &MockServer) -> (Arc<Scheduler>, mpsc::Receiver<Uuid>) {
        let framework = Framework::new(&Registry::in_tree(), &Profile::default()).unwrap();
        Scheduler::new(server.uri(), framework)
    }

    fn energy_node(energy: &str) -> Node {
        let mut node = Node::default();
        node.labels
            .insert(ENERGY_SCORE_LABEL.to_string(), energy.to_string());
        node
    }

    #[tokio::test]
    async fn test_handle_pod_event_schedule_pod() {
        // Setup state and mocked patch endpoint
        let mock_server = start_mock_server().await;
        let (sched, mut rx) = scheduler(&mock_server);

        let pod = Pod::default();
        let low = energy_node("3");
        let high = energy_node("9");

        // Simulate node and pod event
        for node in [&low, &high] {
            sched.handle_node_event(NodeEvent {
                node: node.clone(),
                event_type: EventType::Added,
            });
        }

        sched.handle_pod_event(PodEvent {
            pod: pod.clone(),
            event_type: EventType::Added,
        });

        // Verify pod is queued and scheduled on the greener node
        assert!(sched.state.pods.contains_key(&pod.metadata.id));

        let to_be_scheduled_pod_id = rx.recv().await.expect("Expected pod ID");
        assert_eq!(to_be_scheduled_pod_id, pod.metadata.id);

        sched.schedule(pod.metadata.id).await;

        let node_pods = sched.state.pod_map.get(&high.name);
        assert!(node_pods.unwrap().contains(&pod.metadata.id));
        assert!(sched.state.unscheduled().is_empty());
    }

    #[tokio::test]
    async fn test_handle_node_event_schedule_unscheduled_pods() {
        let mock_server = start_mock_server().await;
        let (sched, mut rx) = scheduler(&mock_server);

        // Simulate pod being added before any nodes exist
        let pod = Pod::default();
        sched.handle_pod_event(PodEvent {
            pod: pod.clone(),
            event_type: EventType::Added,
        });
        // replicate worker
        {
            let sched = sched.clone();
            tokio::spawn(async move {
                while let Some(pod_id) = rx.recv().await {
                    sched.schedule(pod_id).await;
                }
            });
        }

        // Add node and verify scheduling occurs
        let node = energy_node("1");
        sched.handle_node_event(NodeEvent {
            node: node.clone(),
            event_type: EventType::Added,
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let node_pods = sched.state.pod_map.get(&node.name);
        assert!(node_pods.unwrap().contains(&pod.metadata.id));
        assert!(sched.state.unscheduled().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_keeps_pod_unscheduled() {
        let mock_server = start_mock_server().await;
        let (sched, mut rx) = scheduler(&mock_server);

        // Fill the queue without a worker draining it
        let pods: Vec<Pod> = (0..101).map(|_| Pod::default()).collect();
        for pod in &pods {
            sched.handle_pod_event(PodEvent {
                pod: pod.clone(),
                event_type: EventType::Added,
            });
        }

        // The rejected pod is still tracked and waits for the next node event
        assert_eq!(sched.state.unscheduled().len(), 101);
        let mut queued = 0;
        while rx.try_recv().is_ok() {
            queued += 1;
        }
        assert_eq!(queued, 100);

        // Forget the queued ones so only the rejected pod is left
        for pod in &pods[..100] {
            sched.handle_pod_event(PodEvent {
                pod: pod.clone(),
                event_type: EventType::Deleted,
            });
        }

        let node = energy_node("1");
        sched.handle_node_event(NodeEvent {
            node,
            event_type: EventType::Added,
        });
        let mut requeued = Vec::new();
        while let Ok(id) = rx.try_recv() {
            requeued.push(id);
        }
        assert_eq!(requeued, vec![pods[100].metadata.id]);
    }

    #[tokio::test]
    async fn test_bound_pods_are_ignored() {
        let mock_server = start_mock_server().await;
        let (sched, _rx) = scheduler(&mock_server);

        let mut pod = Pod::default();
        pod.spec.node_name = "elsewhere".to_string();
        sched.handle_pod_event(PodEvent {
            pod: pod.clone(),
            event_type: EventType::Added,
        });
        assert!(!sched.state.pods.contains_key(&pod.metadata.id));
    }

    #[tokio::test]
    async fn test_deleted_node_is_forgotten() {
        let mock_server = start_mock_server().await;
        let (sched, _rx) = scheduler(&mock_server);
        let node = Node::default();

        sched.handle_node_event(NodeEvent {
            node: node.clone(),
            event_type: EventType::Added,
        });
        sched.handle_node_event(NodeEvent {
            node: node.clone(),
            event_type: EventType::Deleted,
        });
        assert!(!sched.state.nodes.contains_key(&node.name));
    }
}
