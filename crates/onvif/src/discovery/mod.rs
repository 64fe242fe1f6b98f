// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Discovery probe/response engine.
//!
//! # Flow
//!
//! ```text
//! bind 0.0.0.0:0 (SO_REUSEADDR) -> join 239.255.255.250 -> Probe -> :3702
//!                                                                   |
//!        Vec<DeviceDescriptor> <- dedup by address <- ProbeMatch* <--+
//!                       (until the wall-clock deadline expires)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! let devices = onvif::discover(Duration::from_secs(3), "0.0.0.0")?;
//! for d in &devices {
//!     println!("{}:{} {:?}", d.address, d.port, d.name());
//! }
//! # Ok::<(), onvif::Error>(())
//! ```
//!
//! An empty result is the normal outcome on a quiet network. Errors are
//! reserved for failing to acquire the socket or the multicast membership.

mod descriptor;
mod probe;
mod probe_match;

pub use descriptor::{DeviceDescriptor, Scope};
pub use probe::Probe;
pub use probe_match::{parse_datagram, parse_probe_match};

use crate::config::{DiscoveryConfig, DISCOVERY_RECV_BUFFER_SIZE};
use crate::error::{Error, Result};
use crate::transport::DiscoverySocket;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Probe the local network for `timeout` and return every distinct device.
///
/// `bind_address` selects the local IPv4 interface (`"0.0.0.0"` for all).
/// The call always occupies the full `timeout`.
pub fn discover(timeout: Duration, bind_address: &str) -> Result<Vec<DeviceDescriptor>> {
    discover_with(&DiscoveryConfig::new(timeout, bind_address))
}

/// [`discover`] with full control over target, probe types and re-probing.
pub fn discover_with(config: &DiscoveryConfig) -> Result<Vec<DeviceDescriptor>> {
    if config.timeout.is_zero() {
        return Err(Error::InvalidArgument(
            "discovery timeout must be greater than zero".into(),
        ));
    }

    let socket = DiscoverySocket::open(config)?;
    let deadline = Instant::now() + config.timeout;

    send_probe(&socket, config)?;
    let mut next_probe = config.reprobe_interval.map(|i| Instant::now() + i);

    let mut collector = Collector::default();
    let mut buf = vec![0u8; DISCOVERY_RECV_BUFFER_SIZE];

    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        if let (Some(at), Some(interval)) = (next_probe, config.reprobe_interval) {
            if now >= at {
                // A lost re-probe must not cost the devices already collected.
                if let Err(e) = send_probe(&socket, config) {
                    log::debug!("[WS-Discovery] re-probe failed: {}", e);
                }
                next_probe = Some(now + interval);
            }
        }

        let wake = next_probe.map_or(deadline, |at| at.min(deadline));
        if let Some((len, from)) = socket.recv_before(&mut buf, wake)? {
            collector.ingest(&buf[..len], from);
        }
    }

    log::debug!(
        "[WS-Discovery] window closed after {:?}: {} device(s), {} datagram(s) ignored",
        config.timeout,
        collector.descriptors.len(),
        collector.ignored
    );
    Ok(collector.into_descriptors())
}

fn send_probe(socket: &DiscoverySocket, config: &DiscoveryConfig) -> Result<()> {
    let probe = Probe::new(&config.probe_types);
    let sent = socket.send_to(probe.to_xml().as_bytes(), config.target)?;
    log::debug!(
        "[WS-Discovery] probe {} sent to {} ({} bytes)",
        probe.message_id(),
        config.target,
        sent
    );
    Ok(())
}

/// Accumulates descriptors, first seen address wins.
#[derive(Debug, Default)]
pub struct Collector {
    seen: HashSet<String>,
    descriptors: Vec<DeviceDescriptor>,
    ignored: usize,
}

impl Collector {
    /// Feed one datagram. Returns how many new devices it contributed.
    pub fn ingest(&mut self, datagram: &[u8], from: SocketAddr) -> usize {
        let found = parse_datagram(datagram);
        if found.is_empty() {
            self.ignored += 1;
            return 0;
        }

        let mut added = 0;
        for descriptor in found {
            if self.seen.insert(descriptor.address.clone()) {
                log::debug!(
                    "[WS-Discovery] found {}:{} (from {})",
                    descriptor.address,
                    descriptor.port,
                    from
                );
                self.descriptors.push(descriptor);
                added += 1;
            } else {
                log::trace!("[WS-Discovery] duplicate reply for {}", descriptor.address);
            }
        }
        added
    }

    /// Devices collected so far, in arrival order.
    pub fn descriptors(&self) -> &[DeviceDescriptor] {
        &self.descriptors
    }

    /// Consume into the collected devices.
    pub fn into_descriptors(self) -> Vec<DeviceDescriptor> {
        self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(xaddr: &str, name: &str) -> String {
        format!(
            r#"<e:Envelope xmlns:e="http://www.w3.org/2003/05/soap-envelope"
                 xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery">
               <e:Body><d:ProbeMatches><d:ProbeMatch>
                 <d:Scopes>onvif://www.onvif.org/name/{}</d:Scopes>
                 <d:XAddrs>{}</d:XAddrs>
               </d:ProbeMatch></d:ProbeMatches></e:Body></e:Envelope>"#,
            name, xaddr
        )
    }

    fn from() -> SocketAddr {
        "192.168.1.100:3702".parse().unwrap()
    }

    #[test]
    fn test_collector_dedups_by_address() {
        let mut c = Collector::default();
        assert_eq!(
            c.ingest(reply("http://192.168.1.100/onvif/device_service", "First").as_bytes(), from()),
            1
        );
        // Same host, different port and name: still a duplicate.
        assert_eq!(
            c.ingest(reply("http://192.168.1.100:8080/onvif/device_service", "Second").as_bytes(), from()),
            0
        );
        assert_eq!(
            c.ingest(reply("http://192.168.1.101/onvif/device_service", "Other").as_bytes(), from()),
            1
        );

        let devices = c.into_descriptors();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name(), Some("First"));
        assert_eq!(devices[0].port, 80);
        assert_eq!(devices[1].address, "192.168.1.101");
    }

    #[test]
    fn test_collector_ignores_garbage() {
        let mut c = Collector::default();
        assert_eq!(c.ingest(b"garbage", from()), 0);
        assert_eq!(c.ingest(b"<a><b/></a>", from()), 0);
        assert!(c.descriptors().is_empty());
        assert_eq!(c.ignored, 2);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = discover(Duration::ZERO, "0.0.0.0").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_bad_bind_address_rejected() {
        let err = discover(Duration::from_millis(10), "not-an-ip").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
