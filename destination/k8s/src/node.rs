//! Node -> locality

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ResourceExt};
use linkerd_destination_core::{DiscoverNodeTopology, NodeTopology};
use tracing::{debug, instrument};

pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";
pub const REGION_LABEL: &str = "topology.kubernetes.io/region";

/// Looks up node localities from the Kubernetes API.
#[derive(Clone)]
pub struct Nodes {
    api: Api<Node>,
}

/// Extracts the locality of a node from its well-known topology labels.
pub fn node_topology(node: &Node) -> NodeTopology {
    node.labels()
        .iter()
        .filter(|(k, _)| matches!(k.as_str(), HOSTNAME_LABEL | ZONE_LABEL | REGION_LABEL))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// === impl Nodes ===

impl Nodes {
    pub fn new(client: kube::Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

impl std::fmt::Debug for Nodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nodes").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl DiscoverNodeTopology for Nodes {
    #[instrument(skip(self))]
    async fn get_node_topology(&self, node_name: &str) -> Result<NodeTopology> {
        let node = self
            .api
            .get(node_name)
            .await
            .with_context(|| format!("failed to get node {node_name}"))?;
        let topology = node_topology(&node);
        debug!(?topology, "Resolved");
        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;
    use maplit::btreemap;

    fn mk_node(labels: std::collections::BTreeMap<String, String>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("node-1".to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn keeps_only_topology_labels() {
        let node = mk_node(btreemap! {
            HOSTNAME_LABEL.to_string() => "node-1".to_string(),
            ZONE_LABEL.to_string() => "east-1a".to_string(),
            REGION_LABEL.to_string() => "east".to_string(),
            "kubernetes.io/os".to_string() => "linux".to_string(),
            "node.kubernetes.io/instance-type".to_string() => "m5.large".to_string(),
        });

        let topology = node_topology(&node);
        assert_eq!(topology.get(HOSTNAME_LABEL), Some("node-1"));
        assert_eq!(topology.get(ZONE_LABEL), Some("east-1a"));
        assert_eq!(topology.get(REGION_LABEL), Some("east"));
        assert_eq!(topology.get("kubernetes.io/os"), None);
        assert_eq!(topology.get("node.kubernetes.io/instance-type"), None);
    }

    #[test]
    fn unlabeled_node() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("node-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(node_topology(&node).is_empty());

        let node = mk_node(btreemap! {
            "kubernetes.io/os".to_string() => "linux".to_string(),
        });
        assert!(node_topology(&node).is_empty());
    }
}
