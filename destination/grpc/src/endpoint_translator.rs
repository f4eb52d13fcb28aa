use crate::{
    addr::{to_tcp_addr, AddrError},
    metrics::{TranslatorMetrics, UpdateKind},
    sink::UpdateSink,
};
use linkerd2_proxy_api::{destination as proto, net};
use linkerd_destination_core::{
    diff, filter, AddressSet, Diff, Endpoint, EndpointKind, EndpointUpdateListener, External, Id,
    Labels, NodeTopology, Workload, IDENTITY_MODE_DEFAULT,
};
use std::sync::Arc;
use tracing::{debug, error};


/// Weight assigned to every endpoint sent to clients.
pub const DEFAULT_WEIGHT: u32 = 10_000;

#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    /// The namespace of the control plane that this service belongs to.
    pub controller_ns: String,

    /// Identities are only issued to workloads when a trust domain is set.
    pub identity_trust_domain: Option<String>,

    pub enable_h2_upgrade: bool,
}

/// Translates membership updates for a single service into destination updates for a single
/// client.
///
/// The translator tracks every endpoint known for the service and the subset of them that the
/// client was last told about. Each update narrows the known endpoints by the service's topology
/// preference, relative to the client's node, and only the difference against what the client
/// already knows is sent.
#[derive(Debug)]
pub struct EndpointTranslator<S> {
    config: Arc<TranslatorConfig>,
    node_topology: NodeTopology,
    available: AddressSet,
    snapshot: AddressSet,
    sink: S,
    metrics: TranslatorMetrics,
    span: tracing::Span,
}

// === impl TranslatorConfig ===

impl TranslatorConfig {
    fn workload_identity(&self, workload: &Workload) -> Option<String> {
        let trust_domain = self
            .identity_trust_domain
            .as_deref()
            .filter(|td| !td.is_empty())?;
        if workload.control_plane_ns.as_deref() != Some(self.controller_ns.as_str()) {
            return None;
        }
        if workload.identity_mode.as_deref() != Some(IDENTITY_MODE_DEFAULT) {
            return None;
        }

        Some(format!(
            "{}.{}.serviceaccount.identity.{}.{}",
            workload.service_account, workload.namespace, self.controller_ns, trust_domain
        ))
    }
}

// === impl EndpointTranslator ===

impl<S: UpdateSink> EndpointTranslator<S> {
    pub fn new(
        config: Arc<TranslatorConfig>,
        node_topology: NodeTopology,
        sink: S,
        metrics: TranslatorMetrics,
        service: &str,
    ) -> Self {
        Self {
            config,
            node_topology,
            available: AddressSet::default(),
            snapshot: AddressSet::default(),
            sink,
            metrics,
            span: tracing::debug_span!("endpoint_translator", %service),
        }
    }

    /// All endpoints currently known for the service.
    pub fn available(&self) -> &AddressSet {
        &self.available
    }

    /// The endpoints that the client was last told about.
    pub fn snapshot(&self) -> &AddressSet {
        &self.snapshot
    }

    fn send_filtered_update(
        &mut self,
        labels: Labels,
        pref: Vec<String>,
    ) -> Result<(), tonic::Status> {
        self.available.labels = labels;
        self.available.topological_pref = pref;

        let filtered = filter(&self.available, &self.node_topology);
        debug!(
            filtered = filtered.len(),
            available = self.available.len(),
            pref = ?self.available.topological_pref,
            "Filtered endpoints"
        );

        let Diff { add, remove } = diff(&filtered, &self.snapshot);
        let mut result = Ok(());
        if !add.is_empty() {
            result = self.send_add(add);
        }
        if !remove.is_empty() {
            let removed = self.send_remove(remove);
            if result.is_ok() {
                result = removed;
            }
        }

        self.snapshot = filtered;
        result
    }

    fn send_add(&mut self, set: AddressSet) -> Result<(), tonic::Status> {
        let addrs = sorted(set.addresses)
            .into_iter()
            .filter_map(|(id, ep)| match self.to_weighted_addr(&ep) {
                Ok(addr) => Some(addr),
                Err(error) => {
                    self.metrics.invalid_address();
                    error!(%id, %error, "Failed to translate endpoint to weighted address");
                    None
                }
            })
            .collect();

        let update = proto::Update {
            update: Some(proto::update::Update::Add(proto::WeightedAddrSet {
                addrs,
                metric_labels: set.labels.into_iter().collect(),
            })),
        };
        self.send(UpdateKind::Add, update)
    }

    fn send_remove(&mut self, set: AddressSet) -> Result<(), tonic::Status> {
        let addrs = sorted(set.addresses)
            .into_iter()
            .filter_map(|(id, ep)| match to_tcp_addr(&ep) {
                Ok(addr) => Some(addr),
                Err(error) => {
                    self.metrics.invalid_address();
                    error!(%id, %error, "Failed to translate endpoint to address");
                    None
                }
            })
            .collect();

        let update = proto::Update {
            update: Some(proto::update::Update::Remove(proto::AddrSet { addrs })),
        };
        self.send(UpdateKind::Remove, update)
    }

    fn send(&mut self, kind: UpdateKind, update: proto::Update) -> Result<(), tonic::Status> {
        debug!(%kind, ?update, "Sending update");
        match self.sink.send(update) {
            Ok(()) => {
                self.metrics.sent(kind);
                Ok(())
            }
            Err(status) => {
                self.metrics.send_failed(kind);
                error!(%status, "Failed to send address update");
                Err(status)
            }
        }
    }

    fn to_weighted_addr(&self, ep: &Endpoint) -> Result<proto::WeightedAddr, AddrError> {
        let addr = to_tcp_addr(ep)?;
        let weighted = match &ep.kind {
            EndpointKind::Workload(workload) => self.workload_addr(addr, workload),
            EndpointKind::External(external) => self.external_addr(addr, external),
        };
        Ok(weighted)
    }

    fn workload_addr(&self, addr: net::TcpAddress, workload: &Workload) -> proto::WeightedAddr {
        let tls_identity = self.config.workload_identity(workload).map(dns_like_identity);

        // Proxies injected by any control plane accept upgraded connections.
        let protocol_hint = (self.config.enable_h2_upgrade
            && workload
                .control_plane_ns
                .as_deref()
                .is_some_and(|ns| !ns.is_empty()))
        .then(h2_hint);

        proto::WeightedAddr {
            addr: Some(addr),
            weight: DEFAULT_WEIGHT,
            metric_labels: workload.labels.clone().into_iter().collect(),
            tls_identity,
            protocol_hint,
            ..Default::default()
        }
    }

    fn external_addr(&self, addr: net::TcpAddress, external: &External) -> proto::WeightedAddr {
        let authority_override = external
            .authority_override
            .as_ref()
            .filter(|a| !a.is_empty())
            .map(|a| proto::AuthorityOverride {
                authority_override: a.clone(),
            });

        let mut weighted = proto::WeightedAddr {
            addr: Some(addr),
            weight: DEFAULT_WEIGHT,
            authority_override,
            ..Default::default()
        };

        if let Some(identity) = external.identity.as_ref().filter(|id| !id.is_empty()) {
            weighted.tls_identity = Some(dns_like_identity(identity.clone()));
            if self.config.enable_h2_upgrade {
                weighted.protocol_hint = Some(h2_hint());
            }
        }

        weighted
    }
}

impl<S: UpdateSink> EndpointUpdateListener for EndpointTranslator<S> {
    type Error = tonic::Status;

    fn add(&mut self, set: AddressSet) -> Result<(), tonic::Status> {
        let span = self.span.clone();
        let _enter = span.enter();

        let AddressSet {
            addresses,
            labels,
            topological_pref,
        } = set;
        debug!(addresses = addresses.len(), "Adding endpoints");
        self.available.addresses.extend(addresses);
        self.send_filtered_update(labels, topological_pref)
    }

    fn remove(&mut self, set: AddressSet) -> Result<(), tonic::Status> {
        let span = self.span.clone();
        let _enter = span.enter();

        let AddressSet {
            addresses,
            labels,
            topological_pref,
        } = set;
        debug!(addresses = addresses.len(), "Removing endpoints");
        for id in addresses.keys() {
            self.available.addresses.remove(id);
        }
        self.send_filtered_update(labels, topological_pref)
    }

    fn no_endpoints(&mut self, exists: bool) -> Result<(), tonic::Status> {
        let span = self.span.clone();
        let _enter = span.enter();

        debug!(exists, "No endpoints");
        self.available.addresses.clear();
        self.snapshot.addresses.clear();

        let update = proto::Update {
            update: Some(proto::update::Update::NoEndpoints(proto::NoEndpoints {
                exists,
            })),
        };
        self.send(UpdateKind::NoEndpoints, update)
    }
}

fn sorted(addresses: impl IntoIterator<Item = (Id, Endpoint)>) -> Vec<(Id, Endpoint)> {
    let mut addresses = addresses.into_iter().collect::<Vec<_>>();
    addresses.sort_by(|(a, _), (b, _)| a.cmp(b));
    addresses
}

fn dns_like_identity(name: String) -> proto::TlsIdentity {
    proto::TlsIdentity {
        strategy: Some(proto::tls_identity::Strategy::DnsLikeIdentity(
            proto::tls_identity::DnsLikeIdentity { name },
        )),
        ..Default::default()
    }
}

fn h2_hint() -> proto::ProtocolHint {
    proto::ProtocolHint {
        protocol: Some(proto::protocol_hint::Protocol::H2(
            proto::protocol_hint::H2 {},
        )),
        ..Default::default()
    }
}
