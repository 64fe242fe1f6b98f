// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Directed (unicast) discovery against a loopback responder.

use onvif::{discover_with, DiscoveryConfig};
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

fn probe_match(message_id: &str, xaddrs: &str, name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing"
    xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"
    xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
  <SOAP-ENV:Header>
    <wsa:RelatesTo>{id}</wsa:RelatesTo>
    <wsa:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches</wsa:Action>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <d:ProbeMatches>
      <d:ProbeMatch>
        <wsa:EndpointReference><wsa:Address>urn:uuid:{name}</wsa:Address></wsa:EndpointReference>
        <d:Types>dn:NetworkVideoTransmitter</d:Types>
        <d:Scopes>onvif://www.onvif.org/name/{name} onvif://www.onvif.org/hardware/IPC</d:Scopes>
        <d:XAddrs>{xaddrs}</d:XAddrs>
        <d:MetadataVersion>1</d:MetadataVersion>
      </d:ProbeMatch>
    </d:ProbeMatches>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
        id = message_id,
        xaddrs = xaddrs,
        name = name
    )
}

fn message_id(probe: &str) -> String {
    let doc = roxmltree::Document::parse(probe).unwrap();
    doc.descendants()
        .find(|n| n.tag_name().name() == "MessageID")
        .and_then(|n| n.text())
        .unwrap()
        .to_string()
}

/// Answers every probe until `lifetime` runs out; returns the probes seen.
fn responder(
    lifetime: Duration,
    answer: impl Fn(&str) -> Vec<String> + Send + 'static,
) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let deadline = Instant::now() + lifetime;
        let mut probes = Vec::new();
        let mut buf = [0u8; 65536];
        while Instant::now() < deadline {
            let (len, from) = match socket.recv_from(&mut buf) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let probe = String::from_utf8_lossy(&buf[..len]).into_owned();
            for datagram in answer(&probe) {
                socket.send_to(datagram.as_bytes(), from).unwrap();
            }
            probes.push(probe);
        }
        probes
    });
    (addr, handle)
}

#[test]
fn test_directed_probe_collects_distinct_devices() {
    let (addr, handle) = responder(Duration::from_secs(2), |probe| {
        let id = message_id(probe);
        vec![
            "not xml at all".to_string(),
            // No XAddrs: skipped.
            probe_match(&id, "", "NoAddr").replace("<d:XAddrs></d:XAddrs>", ""),
            probe_match(&id, "http://192.168.1.100/onvif/device_service", "Cam1"),
            probe_match(&id, "http://192.168.1.100:8080/onvif/device_service", "Cam1Again"),
            probe_match(&id, "http://192.168.1.101:8000/onvif/device_service", "Cam2"),
        ]
    });

    let timeout = Duration::from_millis(600);
    let config = DiscoveryConfig::new(timeout, "127.0.0.1").with_target(addr);

    let started = Instant::now();
    let devices = discover_with(&config).unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= timeout, "returned early after {:?}", elapsed);
    assert!(elapsed < timeout + Duration::from_secs(1), "overran: {:?}", elapsed);

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].address, "192.168.1.100");
    assert_eq!(devices[0].port, 80);
    assert_eq!(devices[0].name(), Some("Cam1"));
    assert_eq!(devices[0].hardware(), Some("IPC"));
    assert_eq!(devices[0].endpoint_reference.as_deref(), Some("urn:uuid:Cam1"));
    assert_eq!(devices[1].address, "192.168.1.101");
    assert_eq!(devices[1].port, 8000);

    let probes = handle.join().unwrap();
    assert_eq!(probes.len(), 1);
    assert!(probes[0].contains("<wsd:Types>wsdp:Device</wsd:Types>"));
}

#[test]
fn test_reprobe_uses_fresh_message_ids() {
    let (addr, handle) = responder(Duration::from_secs(2), |probe| {
        vec![probe_match(
            &message_id(probe),
            "http://10.0.0.5/onvif/device_service",
            "Cam",
        )]
    });

    let config = DiscoveryConfig::new(Duration::from_millis(500), "127.0.0.1")
        .with_target(addr)
        .with_reprobe_interval(Duration::from_millis(150));
    let devices = discover_with(&config).unwrap();
    assert_eq!(devices.len(), 1);

    let probes = handle.join().unwrap();
    assert!(probes.len() >= 2, "only {} probe(s) sent", probes.len());
    let ids: Vec<String> = probes.iter().map(|p| message_id(p)).collect();
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_silent_network_is_empty_not_error() {
    // Reserve a port, then close it so nothing answers.
    let target = {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap()
    };

    let timeout = Duration::from_millis(300);
    let config = DiscoveryConfig::new(timeout, "127.0.0.1").with_target(target);
    let started = Instant::now();
    let devices = discover_with(&config).unwrap();

    assert!(devices.is_empty());
    assert!(started.elapsed() >= timeout);
}

#[test]
fn test_zero_timeout_is_rejected() {
    let config = DiscoveryConfig::new(Duration::ZERO, "127.0.0.1");
    let err = discover_with(&config).unwrap_err();
    assert_eq!(err.kind(), onvif::ErrorKind::InvalidArgument);
}

#[test]
fn test_invalid_bind_address_is_rejected() {
    let err = onvif::discover(Duration::from_millis(100), "not-an-ip").unwrap_err();
    assert_eq!(err.kind(), onvif::ErrorKind::InvalidArgument);
}
