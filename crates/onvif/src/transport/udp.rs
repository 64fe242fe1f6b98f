// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP socket for one WS-Discovery run.
//!
//! Owns the socket and its multicast membership; both are released when the
//! [`DiscoverySocket`] is dropped, whichever way the receive loop exits.

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::transport::multicast::{
    get_multicast_interfaces, join_multicast_group, leave_multicast_group,
};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Instant;

struct Membership {
    group: Ipv4Addr,
    interfaces: Vec<Ipv4Addr>,
}

/// Exclusively owned discovery socket.
pub struct DiscoverySocket {
    socket: UdpSocket,
    membership: Option<Membership>,
}

impl std::fmt::Debug for DiscoverySocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverySocket")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("group", &self.membership.as_ref().map(|m| m.group))
            .finish()
    }
}

/// Parse the caller's bind address. An empty string means all interfaces.
pub fn parse_bind_address(bind_address: &str) -> Result<Ipv4Addr> {
    let trimmed = bind_address.trim();
    if trimmed.is_empty() {
        return Ok(Ipv4Addr::UNSPECIFIED);
    }
    trimmed.parse::<Ipv4Addr>().map_err(|_| {
        Error::InvalidArgument(format!(
            "bind address '{}' is not an IPv4 address",
            bind_address
        ))
    })
}

/// Create a UDP socket bound to `addr:0` with address reuse.
///
/// SO_REUSEADDR is required (other discovery tools may share the host);
/// SO_REUSEPORT is best effort.
pub fn bind_reusable(addr: Ipv4Addr) -> Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| Error::BindFailed(format!("socket creation failed: {}", e)))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| Error::BindFailed(format!("SO_REUSEADDR rejected: {}", e)))?;

    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    if let Err(e) = socket.set_reuse_port(true) {
        log::debug!("[WS-Discovery] SO_REUSEPORT unavailable, continuing without: {}", e);
    }

    let bind_addr = SocketAddr::V4(SocketAddrV4::new(addr, 0));
    socket
        .bind(&bind_addr.into())
        .map_err(|e| Error::BindFailed(format!("bind {} failed: {}", bind_addr, e)))?;
    Ok(socket)
}

impl DiscoverySocket {
    /// Open the socket described by `config`.
    ///
    /// A multicast target joins the group; a unicast target (directed
    /// probe) does not.
    pub fn open(config: &DiscoveryConfig) -> Result<Self> {
        let bind_ip = parse_bind_address(&config.bind_address)?;
        let socket = bind_reusable(bind_ip)?;

        let multicast_group = match config.target {
            SocketAddr::V4(v4) if v4.ip().is_multicast() => Some(*v4.ip()),
            SocketAddr::V4(_) => None,
            SocketAddr::V6(_) => {
                return Err(Error::InvalidArgument(format!(
                    "probe target {} is not IPv4",
                    config.target
                )))
            }
        };

        // Outgoing interface for the probe: explicit override, then the bind address.
        let send_iface = config
            .multicast_interface
            .or_else(|| (!bind_ip.is_unspecified()).then_some(bind_ip));

        if multicast_group.is_some() {
            socket
                .set_multicast_ttl_v4(config.multicast_ttl)
                .map_err(|e| Error::BindFailed(format!("multicast TTL rejected: {}", e)))?;
            if let Err(e) = socket.set_multicast_loop_v4(true) {
                log::debug!("[WS-Discovery] multicast loop unavailable: {}", e);
            }
            if let Some(iface) = send_iface {
                socket.set_multicast_if_v4(&iface).map_err(|e| {
                    Error::MulticastJoinFailed(format!("IP_MULTICAST_IF {}: {}", iface, e))
                })?;
            }
        }

        let socket: UdpSocket = socket.into();
        let membership = match multicast_group {
            Some(group) => {
                let interfaces = get_multicast_interfaces(send_iface);
                let joined = join_multicast_group(&socket, group, &interfaces)
                    .map_err(|e| Error::MulticastJoinFailed(format!("{}: {}", group, e)))?;
                Some(Membership {
                    group,
                    interfaces: joined,
                })
            }
            None => None,
        };

        log::debug!(
            "[WS-Discovery] socket bound to {} target={} multicast={}",
            socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".into()),
            config.target,
            membership.is_some()
        );

        Ok(Self { socket, membership })
    }

    /// Local address of the socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram.
    pub fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<usize> {
        self.socket.send_to(data, target).map_err(|e| {
            log::debug!("[WS-Discovery] send to {} failed: {}", target, e);
            Error::SendFailed(format!("{}: {}", target, e))
        })
    }

    /// Receive one datagram, waiting no later than `until`.
    ///
    /// `Ok(None)` means nothing arrived in time (or the wait was cut short
    /// by a transient condition); the caller re-checks its deadline.
    pub fn recv_before(
        &self,
        buf: &mut [u8],
        until: Instant,
    ) -> Result<Option<(usize, SocketAddr)>> {
        let remaining = until.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        self.socket.set_read_timeout(Some(remaining))?;

        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => {
                    Ok(None)
                }
                // ICMP port unreachable from a directed probe (reported on Windows).
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused => {
                    log::debug!("[WS-Discovery] ignoring recv error: {}", e);
                    Ok(None)
                }
                _ => Err(Error::IoError(e)),
            },
        }
    }
}

impl Drop for DiscoverySocket {
    fn drop(&mut self) {
        if let Some(m) = self.membership.take() {
            leave_multicast_group(&self.socket, m.group, &m.interfaces);
            log::trace!("[WS-Discovery] left group {}", m.group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(parse_bind_address("").unwrap(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            Ipv4Addr::UNSPECIFIED
        );
        assert_eq!(
            parse_bind_address(" 127.0.0.1 ").unwrap(),
            Ipv4Addr::LOCALHOST
        );
        assert!(matches!(
            parse_bind_address("camera.local"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_directed_socket_binds_ephemeral_port() {
        let config = DiscoveryConfig::new(Duration::from_millis(100), "127.0.0.1")
            .with_target("127.0.0.1:9".parse().unwrap());
        let socket = DiscoverySocket::open(&config).unwrap();
        let local = socket.local_addr().unwrap();
        assert_eq!(local.ip(), std::net::IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(local.port(), 0);
        assert!(socket.membership.is_none());
    }

    #[test]
    fn test_recv_before_past_deadline_returns_immediately() {
        let config = DiscoveryConfig::new(Duration::from_millis(100), "127.0.0.1")
            .with_target("127.0.0.1:9".parse().unwrap());
        let socket = DiscoverySocket::open(&config).unwrap();
        let mut buf = [0u8; 16];
        let start = Instant::now();
        assert!(socket.recv_before(&mut buf, start).unwrap().is_none());
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_ipv6_target_rejected() {
        let config = DiscoveryConfig::new(Duration::from_millis(100), "0.0.0.0")
            .with_target("[::1]:3702".parse().unwrap());
        assert!(matches!(
            DiscoverySocket::open(&config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
