use crate::address::{AddressSet, Labels};
use ahash::AHashMap as HashMap;
use anyhow::Result;

/// A topological preference that matches all endpoints.
pub const WILDCARD: &str = "*";

/// The locality of the node that a client runs on, keyed by topology dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTopology(Labels);

/// Resolves the locality of a client's node.
#[async_trait::async_trait]
pub trait DiscoverNodeTopology {
    async fn get_node_topology(&self, node_name: &str) -> Result<NodeTopology>;
}

/// Narrows `available` to the endpoints that share the node's locality.
///
/// Preferences are tried in order and the first one that selects at least one endpoint wins;
/// matches are never aggregated across preferences. A preference for which the node has no
/// locality is skipped, and the wildcard preference selects every endpoint. When the set has no
/// preference, it is returned unfiltered. When no preference selects an endpoint, the result is
/// empty.
pub fn filter(available: &AddressSet, node: &NodeTopology) -> AddressSet {
    if available.topological_pref.is_empty() {
        return available.clone();
    }

    for pref in available.topological_pref.iter() {
        if pref == WILDCARD {
            return available.clone();
        }

        let locality = match node.get(pref) {
            Some(locality) => locality,
            None => continue,
        };

        let filtered = available
            .addresses
            .iter()
            .filter(|(_, ep)| ep.locality(pref) == locality)
            .map(|(id, ep)| (id.clone(), ep.clone()))
            .collect::<HashMap<_, _>>();
        if !filtered.is_empty() {
            return available.with_addresses(filtered);
        }
    }

    available.with_addresses(HashMap::default())
}

// === impl NodeTopology ===

impl NodeTopology {
    #[inline]
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.0.get(dimension).map(String::as_str)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for NodeTopology {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<(&'static str, &'static str)> for NodeTopology {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
