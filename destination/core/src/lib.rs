//! Linkerd Destination endpoint model.
//!
//! A destination stream is told about the endpoints of a single service, as seen from the node
//! that the requesting proxy runs on. The membership watch reports raw endpoint additions and
//! removals as [`AddressSet`]s; listeners fold these into the full set of known endpoints, narrow
//! it by the service's topology preference and publish only the difference against what the
//! client was last told:
//!
//! ```text
//! [ membership watch ] -> add/remove -> [ available ] -> filter -> diff(snapshot) -> [ client ]
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod address;
mod diff;
mod topology;

pub use self::{
    address::{
        AddressSet, Endpoint, EndpointKind, External, Id, Labels, OwnerRef, Workload,
        IDENTITY_MODE_DEFAULT,
    },
    diff::{diff, Diff},
    topology::{filter, DiscoverNodeTopology, NodeTopology, WILDCARD},
};

/// Consumes membership updates for a single destination stream.
///
/// Calls on a listener are serialized by the membership watch; the listener is the sole owner of
/// the stream's endpoint state.
pub trait EndpointUpdateListener {
    type Error;

    /// Adds (or updates) the endpoints in `set`.
    ///
    /// The set's labels and topological preference replace the listener's current metadata.
    fn add(&mut self, set: AddressSet) -> Result<(), Self::Error>;

    /// Removes the endpoints in `set`.
    ///
    /// The set's labels and topological preference replace the listener's current metadata, even
    /// though only ids are consumed from the set itself.
    fn remove(&mut self, set: AddressSet) -> Result<(), Self::Error>;

    /// Resets all known endpoints.
    ///
    /// `exists` indicates whether the service exists without any endpoints or does not exist at
    /// all.
    fn no_endpoints(&mut self, exists: bool) -> Result<(), Self::Error>;
}
