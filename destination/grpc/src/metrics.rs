use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::{
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counts the updates that endpoint translators publish to their clients.
///
/// Cloned into every translator; all clones share the same counters.
#[derive(Clone, Debug)]
pub struct TranslatorMetrics {
    updates: Family<Labels, Counter>,
    send_errors: Family<Labels, Counter>,
    invalid_addresses: Counter,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) enum UpdateKind {
    Add,
    Remove,
    NoEndpoints,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct Labels {
    kind: &'static str,
}

// === impl TranslatorMetrics ===

impl TranslatorMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let updates = Family::<Labels, Counter>::default();
        reg.register(
            "updates",
            "Total number of destination updates sent to clients",
            updates.clone(),
        );

        let send_errors = Family::<Labels, Counter>::default();
        reg.register(
            "send_errors",
            "Total number of destination updates that could not be sent to clients",
            send_errors.clone(),
        );

        let invalid_addresses = Counter::default();
        reg.register(
            "invalid_addresses",
            "Total number of endpoints omitted from updates because their address is invalid",
            invalid_addresses.clone(),
        );

        Self {
            updates,
            send_errors,
            invalid_addresses,
        }
    }

    pub(crate) fn sent(&self, kind: UpdateKind) {
        self.updates.get_or_create(&Labels::from(kind)).inc();
    }

    pub(crate) fn send_failed(&self, kind: UpdateKind) {
        self.send_errors.get_or_create(&Labels::from(kind)).inc();
    }

    pub(crate) fn invalid_address(&self) {
        self.invalid_addresses.inc();
    }

    #[cfg(test)]
    pub(crate) fn sent_total(&self, kind: UpdateKind) -> u64 {
        self.updates.get_or_create(&Labels::from(kind)).get()
    }

    #[cfg(test)]
    pub(crate) fn send_errors_total(&self, kind: UpdateKind) -> u64 {
        self.send_errors.get_or_create(&Labels::from(kind)).get()
    }

    #[cfg(test)]
    pub(crate) fn invalid_addresses_total(&self) -> u64 {
        self.invalid_addresses.get()
    }
}

// === impl UpdateKind ===

impl UpdateKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::NoEndpoints => "no_endpoints",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UpdateKind> for Labels {
    fn from(kind: UpdateKind) -> Self {
        Self {
            kind: kind.as_str(),
        }
    }
}
