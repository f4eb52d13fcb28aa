use linkerd2_proxy_api::net;
use linkerd_destination_core::Endpoint;
use std::net::{AddrParseError, IpAddr, SocketAddr};

#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("invalid IP address {ip:?}: {source}")]
    Ip {
        ip: String,
        #[source]
        source: AddrParseError,
    },

    #[error("port {0} outside valid range")]
    Port(u32),
}

/// Parses an endpoint's address for the wire.
///
/// Both IPv4 and IPv6 endpoints are accepted; the port must fit in a `u16`.
pub(crate) fn to_tcp_addr(ep: &Endpoint) -> Result<net::TcpAddress, AddrError> {
    let ip = ep.ip.parse::<IpAddr>().map_err(|source| AddrError::Ip {
        ip: ep.ip.clone(),
        source,
    })?;
    let port = u16::try_from(ep.port).map_err(|_| AddrError::Port(ep.port))?;
    Ok(SocketAddr::new(ip, port).into())
}
