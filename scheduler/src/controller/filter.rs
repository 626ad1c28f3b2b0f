use shared::models::Pod;

use crate::framework::{NodeInfo, NodeInfoLister};

pub enum FilterOptions {
    Basic,
    // NodeSelector
}

impl FilterOptions {
    /// Returns the nodes `pod` may run on.
    pub fn filter(&self, lister: &dyn NodeInfoLister, pod: &Pod) -> Vec<NodeInfo> {
        match self {
            FilterOptions::Basic => lister
                .list()
                .into_iter()
                .filter(|info| {
                    let ok = info.node().is_schedulable();
                    if !ok {
                        tracing::debug!(pod=%pod.metadata.name, node=%info.node().name, "Node is stopped");
                    }
                    ok
                })
                .collect(),
        }
    }
}
