// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast group membership and interface discovery.
//!
//! WS-Discovery replies arrive on the group only if the probing socket is a
//! member on the interface the camera sits behind, so the group is joined on
//! every non-loopback IPv4 interface unless a specific one is requested.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Linux EADDRINUSE: membership already held through the same physical NIC.
const EADDRINUSE_LINUX: i32 = 98;

/// Interfaces to join on.
///
/// `preferred` wins when set (from `ONVIF_MULTICAST_IF` or the caller).
/// Otherwise every non-loopback IPv4 address reported by the OS is used.
pub fn get_multicast_interfaces(preferred: Option<Ipv4Addr>) -> Vec<Ipv4Addr> {
    if let Some(addr) = preferred {
        log::debug!("[WS-Discovery] Using multicast interface override: {}", addr);
        return vec![addr];
    }

    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            log::debug!("[WS-Discovery] Failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut addrs: Vec<Ipv4Addr> = Vec::new();
    for (_name, ip) in interfaces {
        if let IpAddr::V4(ipv4) = ip {
            if !ipv4.is_loopback() && !addrs.contains(&ipv4) {
                addrs.push(ipv4);
            }
        }
    }

    log::debug!(
        "[WS-Discovery] Discovered {} non-loopback interfaces",
        addrs.len()
    );
    addrs
}

/// Join `group` on each of `interfaces`.
///
/// Per-interface failures are non-fatal; an empty list falls back to the
/// OS-chosen interface. Returns the interfaces actually joined, and fails
/// only when no join succeeded at all.
pub fn join_multicast_group(
    socket: &UdpSocket,
    group: Ipv4Addr,
    interfaces: &[Ipv4Addr],
) -> io::Result<Vec<Ipv4Addr>> {
    if interfaces.is_empty() {
        log::debug!("[WS-Discovery] No suitable interfaces found, joining on UNSPECIFIED");
        socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        return Ok(vec![Ipv4Addr::UNSPECIFIED]);
    }

    let mut joined = Vec::with_capacity(interfaces.len());
    let mut last_err = None;
    for iface in interfaces {
        match socket.join_multicast_v4(&group, iface) {
            Ok(()) => {
                log::debug!("[WS-Discovery] join_multicast_v4({}) on {}", group, iface);
                joined.push(*iface);
            }
            Err(e) if e.raw_os_error() == Some(EADDRINUSE_LINUX) => {
                log::debug!(
                    "[WS-Discovery] join_multicast_v4({}) on {} - already joined, skipping",
                    group,
                    iface
                );
            }
            Err(e) => {
                // Adapters without multicast support or without a route to the group.
                log::debug!(
                    "[WS-Discovery] join_multicast_v4({}) on {} failed (non-fatal): {}",
                    group,
                    iface,
                    e
                );
                last_err = Some(e);
            }
        }
    }

    match (joined.is_empty(), last_err) {
        (true, Some(e)) => Err(e),
        _ => Ok(joined),
    }
}

/// Drop `group` membership on `interfaces`. Errors are logged only.
pub fn leave_multicast_group(socket: &UdpSocket, group: Ipv4Addr, interfaces: &[Ipv4Addr]) {
    for iface in interfaces {
        if let Err(e) = socket.leave_multicast_v4(&group, iface) {
            log::debug!(
                "[WS-Discovery] leave_multicast_v4({}) on {} failed: {}",
                group,
                iface,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let addr = Ipv4Addr::new(10, 1, 2, 3);
        assert_eq!(get_multicast_interfaces(Some(addr)), vec![addr]);
    }

    #[test]
    fn test_autodetect_excludes_loopback() {
        for addr in get_multicast_interfaces(None) {
            assert!(!addr.is_loopback());
        }
    }
}
