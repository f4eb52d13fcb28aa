//! Kubernetes bindings for destination endpoint translation.
//!
//! Resolves the locality of a client's `Node` and converts `Pod` metadata into the workload
//! records that endpoints carry.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod node;
mod pod;

pub use self::{
    node::{node_topology, Nodes, HOSTNAME_LABEL, REGION_LABEL, ZONE_LABEL},
    pod::{workload, CONTROL_PLANE_NS_LABEL, IDENTITY_MODE_ANNOTATION, POD_TEMPLATE_HASH_LABEL},
};
pub use k8s_openapi::api::core::v1::{Node, Pod};
