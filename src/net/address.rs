//! Host identifier helpers

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

/// Derive the subnet broadcast address for a dotted-quad host.
///
/// Keeps the first three octets and replaces the host octet with 255.
pub fn broadcast_address_for(host: &str) -> Result<Ipv4Addr, ConfigError> {
    let addr: Ipv4Addr = host
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(host.to_string()))?;

    let [a, b, c, _] = addr.octets();
    Ok(Ipv4Addr::new(a, b, c, 255))
}

/// Normalize a configured host identifier.
///
/// Strips surrounding brackets and the IPv4-mapped `::ffff:` prefix, and
/// lowercases hostnames so directory keys compare consistently.
pub fn format_hostname(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    let lower = host.to_ascii_lowercase();
    match lower.strip_prefix("::ffff:") {
        Some(v4) if v4.parse::<Ipv4Addr>().is_ok() => v4.to_string(),
        _ => lower,
    }
}

/// Canonical host string for an address observed on a socket
pub fn peer_host(addr: &SocketAddr) -> String {
    match addr.ip() {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

/// Substitute `%hostname` and `%port` in an announcement template
pub fn render_station_name(template: &str, hostname: &str, port: u16) -> String {
    template
        .replace("%hostname", hostname)
        .replace("%port", &port.to_string())
}
