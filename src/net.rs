use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use anyhow::{Context, Result};

/// Address the probe socket connects to. No packets are sent; connecting a
/// UDP socket only selects the outbound interface.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Determine the IPv4 address of the interface used to reach the public
/// internet by reading the local endpoint of a connected UDP socket.
pub fn resolve_local_ip() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to open probe socket")?;
    socket
        .connect(PROBE_ADDR)
        .with_context(|| format!("No route to {}", PROBE_ADDR))?;
    let local = socket
        .local_addr()
        .context("Failed to read local endpoint of probe socket")?;

    match local.ip() {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => anyhow::bail!("Expected an IPv4 endpoint, got {}", ip),
    }
}

/// Best-effort variant used at startup: any resolution failure is downgraded
/// to the loopback address, regardless of cause.
pub fn local_ip_or_loopback() -> Ipv4Addr {
    match resolve_local_ip() {
        Ok(ip) => ip,
        Err(e) => {
            tracing::warn!("Could not resolve local IP ({:#}), using loopback", e);
            Ipv4Addr::LOCALHOST
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_returns_a_concrete_ipv4() {
        // With a routable network stack this is the outbound interface
        // address; in a sandbox the resolver may fail instead.
        if let Ok(ip) = resolve_local_ip() {
            assert!(!ip.is_unspecified());
        }
    }

    #[test]
    fn fallback_always_yields_an_address() {
        let ip = local_ip_or_loopback();
        assert!(!ip.is_unspecified());
    }
}
