use ahash::AHashMap as HashMap;
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

/// The identity mode under which a workload's proxy obtains its certificate from the control
/// plane that injected it.
pub const IDENTITY_MODE_DEFAULT: &str = "default";

/// Uniquely identifies an endpoint within a destination.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Id {
    pub namespace: String,
    pub name: String,
}

/// A single backend endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// The endpoint's IP, as reported by the membership watch. It is only parsed when the endpoint
    /// is translated for a client.
    pub ip: String,
    pub port: u32,
    pub kind: EndpointKind,

    /// The endpoint's locality, keyed by topology dimension.
    pub topology: Labels,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndpointKind {
    /// The endpoint is backed by a workload that may participate in the mesh.
    Workload(Workload),

    /// The endpoint was resolved without a backing workload.
    External(External),
}

/// Metadata for a workload-backed endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub service_account: String,
    pub owner: Option<OwnerRef>,

    /// The namespace of the control plane that injected this workload, if any.
    pub control_plane_ns: Option<String>,

    /// The identity mode that this workload was configured with, if any.
    pub identity_mode: Option<String>,

    /// Metric labels describing the workload.
    pub labels: Labels,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct External {
    pub identity: Option<String>,
    pub authority_override: Option<String>,
}

/// A set of endpoints with the metadata that applies to all of them.
///
/// Equality is determined solely by the set's addresses.
#[derive(Clone, Debug, Default)]
pub struct AddressSet {
    pub addresses: HashMap<Id, Endpoint>,
    pub labels: Labels,

    /// Topology dimensions, in order of preference, used to narrow the set for a client. When
    /// empty, the set is not filtered.
    pub topological_pref: Vec<String>,
}

// === impl Id ===

impl Id {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl Endpoint ===

impl Endpoint {
    pub fn workload(ip: impl ToString, port: u32, workload: Workload) -> Self {
        Self {
            ip: ip.to_string(),
            port,
            kind: EndpointKind::Workload(workload),
            topology: Labels::default(),
        }
    }

    pub fn external(ip: impl ToString, port: u32, external: External) -> Self {
        Self {
            ip: ip.to_string(),
            port,
            kind: EndpointKind::External(external),
            topology: Labels::default(),
        }
    }

    pub fn with_topology<K, V>(mut self, topology: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: ToString,
        V: ToString,
    {
        self.topology = topology
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// Returns the endpoint's locality for the given topology dimension.
    ///
    /// An endpoint that does not carry the dimension has an empty locality.
    pub fn locality(&self, dimension: &str) -> &str {
        self.topology
            .get(dimension)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

// === impl AddressSet ===

impl AddressSet {
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_topological_pref<S: ToString>(mut self, pref: impl IntoIterator<Item = S>) -> Self {
        self.topological_pref = pref.into_iter().map(|p| p.to_string()).collect();
        self
    }

    /// Builds a set from `addresses` that shares this set's metadata.
    pub(crate) fn with_addresses(&self, addresses: HashMap<Id, Endpoint>) -> Self {
        Self {
            addresses,
            labels: self.labels.clone(),
            topological_pref: self.topological_pref.clone(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: &Id) -> bool {
        self.addresses.contains_key(id)
    }
}

impl PartialEq for AddressSet {
    fn eq(&self, other: &Self) -> bool {
        self.addresses == other.addresses
    }
}

impl Eq for AddressSet {}

impl FromIterator<(Id, Endpoint)> for AddressSet {
    fn from_iter<T: IntoIterator<Item = (Id, Endpoint)>>(iter: T) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}
