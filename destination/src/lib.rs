#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;


pub use self::args::{Args, TranslatorArgs};
pub use linkerd_destination_core as core;
pub use linkerd_destination_grpc as grpc;
pub use linkerd_destination_k8s as k8s;

use self::{
    core::{DiscoverNodeTopology, NodeTopology},
    grpc::{EndpointTranslator, TranslatorConfig, TranslatorMetrics, UpdateSink},
};
use std::sync::Arc;
use tracing::{error, instrument};

/// Builds endpoint translators for destination streams.
///
/// All translators share the same configuration and metrics. Each resolves the topology of its
/// client's node when it is created.
#[derive(Clone, Debug)]
pub struct Destination<T> {
    config: Arc<TranslatorConfig>,
    topology: T,
    metrics: TranslatorMetrics,
}

// === impl Destination ===

impl<T: DiscoverNodeTopology> Destination<T> {
    pub fn new(config: TranslatorConfig, topology: T, metrics: TranslatorMetrics) -> Self {
        Self {
            config: Arc::new(config),
            topology,
            metrics,
        }
    }

    /// Creates a translator for a client on `node_name` that is watching `service`.
    ///
    /// If the node's topology cannot be resolved, the translator proceeds without one.
    #[instrument(skip(self, sink))]
    pub async fn endpoint_translator<S: UpdateSink>(
        &self,
        service: &str,
        node_name: &str,
        sink: S,
    ) -> EndpointTranslator<S> {
        let node_topology = match self.topology.get_node_topology(node_name).await {
            Ok(topology) => topology,
            Err(error) => {
                error!(%error, "Failed to resolve node topology");
                NodeTopology::default()
            }
        };

        EndpointTranslator::new(
            self.config.clone(),
            node_topology,
            sink,
            self.metrics.clone(),
            service,
        )
    }
}
