// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ProbeMatch datagram parsing.
//!
//! Anything sharing the multicast group can land on the socket (Hello/Bye
//! announcements, other vendors' chatter, truncated packets), so parsing
//! never fails: unusable input just yields no descriptor.

use crate::config::DEFAULT_HTTP_PORT;
use crate::discovery::descriptor::{DeviceDescriptor, Scope};
use roxmltree::{Document, Node};
use url::{Host, Url};

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text()).map(str::trim)
}

/// Decode every ProbeMatch in one datagram.
pub fn parse_datagram(data: &[u8]) -> Vec<DeviceDescriptor> {
    let text = match std::str::from_utf8(data) {
        Ok(text) => text,
        Err(_) => {
            log::trace!("[WS-Discovery] discarding non UTF-8 datagram ({} bytes)", data.len());
            return Vec::new();
        }
    };
    let doc = match Document::parse(text) {
        Ok(doc) => doc,
        Err(e) => {
            log::trace!("[WS-Discovery] discarding malformed datagram: {}", e);
            return Vec::new();
        }
    };

    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "ProbeMatch")
        .filter_map(parse_probe_match)
        .collect()
}

/// Decode one `ProbeMatch` element. `None` when it has no usable XAddr.
pub fn parse_probe_match(node: Node<'_, '_>) -> Option<DeviceDescriptor> {
    let service_addresses: Vec<String> = child_text(node, "XAddrs")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let Some(primary) = service_addresses.first() else {
        log::trace!("[WS-Discovery] ProbeMatch without XAddrs, skipping");
        return None;
    };
    let (address, port) = match primary_address(primary) {
        Some(parsed) => parsed,
        None => {
            log::debug!("[WS-Discovery] unusable XAddr '{}', skipping", primary);
            return None;
        }
    };

    let mut types: Vec<String> = Vec::new();
    for token in child_text(node, "Types").unwrap_or_default().split_whitespace() {
        if !types.iter().any(|t| t == token) {
            types.push(token.to_string());
        }
    }

    let scopes = child_text(node, "Scopes")
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(Scope::parse)
        .collect();

    let endpoint_reference = child(node, "EndpointReference")
        .and_then(|epr| child_text(epr, "Address"))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(DeviceDescriptor {
        address,
        port,
        service_addresses,
        types,
        scopes,
        endpoint_reference,
    })
}

/// Host and port of an XAddr URL.
fn primary_address(xaddr: &str) -> Option<(String, u16)> {
    let url = Url::parse(xaddr).ok()?;
    let address = match url.host()? {
        Host::Domain(d) => d.to_string(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    };
    let port = url.port_or_known_default().unwrap_or(DEFAULT_HTTP_PORT);
    Some((address, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_matches(matches: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing"
    xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"
    xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
  <SOAP-ENV:Header>
    <wsa:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/ProbeMatches</wsa:Action>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body><d:ProbeMatches>{}</d:ProbeMatches></SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
            matches
        )
    }

    #[test]
    fn test_reference_scenario() {
        let xml = probe_matches(
            r#"<d:ProbeMatch>
                 <d:XAddrs>http://192.168.1.100/onvif/device_service</d:XAddrs>
                 <d:Scopes>onvif://www.onvif.org/name/Cam1</d:Scopes>
               </d:ProbeMatch>"#,
        );
        let found = parse_datagram(xml.as_bytes());
        assert_eq!(found.len(), 1);
        let d = &found[0];
        assert_eq!(d.address, "192.168.1.100");
        assert_eq!(d.port, 80);
        assert_eq!(
            d.scopes,
            vec![Scope {
                scope_type: "name".into(),
                value: "Cam1".into()
            }]
        );
        assert!(d.types.is_empty());
        assert_eq!(d.endpoint_reference, None);
    }

    #[test]
    fn test_full_probe_match() {
        let xml = probe_matches(
            r#"<d:ProbeMatch>
                 <wsa:EndpointReference>
                   <wsa:Address>urn:uuid:2419d68a-2dd2-21b2-a205-ec71dbab3f4b</wsa:Address>
                 </wsa:EndpointReference>
                 <d:Types>dn:NetworkVideoTransmitter tds:Device dn:NetworkVideoTransmitter</d:Types>
                 <d:Scopes>
                   onvif://www.onvif.org/type/video_encoder
                   onvif://www.onvif.org/hardware/IPC-122
                   onvif://www.onvif.org/name
                   http://example.com/other/scope
                   onvif://www.onvif.org/location/country/china
                 </d:Scopes>
                 <d:XAddrs>http://10.0.0.7:8080/onvif/device_service http://[fe80::1]:8080/onvif/device_service</d:XAddrs>
                 <d:MetadataVersion>1</d:MetadataVersion>
               </d:ProbeMatch>"#,
        );
        let d = parse_datagram(xml.as_bytes()).remove(0);
        assert_eq!(d.address, "10.0.0.7");
        assert_eq!(d.port, 8080);
        assert_eq!(d.service_addresses.len(), 2);
        assert_eq!(d.types, vec!["dn:NetworkVideoTransmitter", "tds:Device"]);
        let scopes: Vec<String> = d.scopes.iter().map(ToString::to_string).collect();
        assert_eq!(
            scopes,
            vec!["type/video_encoder", "hardware/IPC-122", "location/country/china"]
        );
        assert_eq!(
            d.endpoint_reference.as_deref(),
            Some("urn:uuid:2419d68a-2dd2-21b2-a205-ec71dbab3f4b")
        );
    }

    #[test]
    fn test_https_and_ipv6_hosts() {
        let xml = probe_matches(
            r#"<d:ProbeMatch><d:XAddrs>https://cam.local/onvif/device_service</d:XAddrs></d:ProbeMatch>
               <d:ProbeMatch><d:XAddrs>http://[fe80::1]/onvif/device_service</d:XAddrs></d:ProbeMatch>"#,
        );
        let found = parse_datagram(xml.as_bytes());
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].address.as_str(), found[0].port), ("cam.local", 443));
        assert_eq!((found[1].address.as_str(), found[1].port), ("fe80::1", 80));
    }

    #[test]
    fn test_missing_xaddrs_yields_nothing() {
        let xml = probe_matches(
            r#"<d:ProbeMatch>
                 <d:Types>dn:NetworkVideoTransmitter</d:Types>
                 <d:XAddrs>   </d:XAddrs>
               </d:ProbeMatch>
               <d:ProbeMatch><d:Scopes>onvif://www.onvif.org/name/X</d:Scopes></d:ProbeMatch>"#,
        );
        assert!(parse_datagram(xml.as_bytes()).is_empty());
    }

    #[test]
    fn test_garbage_yields_nothing() {
        assert!(parse_datagram(b"").is_empty());
        assert!(parse_datagram(b"M-SEARCH * HTTP/1.1\r\n").is_empty());
        assert!(parse_datagram(&[0xff, 0xfe, 0x00, 0x3c]).is_empty());
        assert!(parse_datagram(b"<Envelope><Body><Hello/></Body></Envelope>").is_empty());
        assert!(parse_datagram(b"<d:ProbeMatch><d:XAddrs>http://x</d:XAddrs>").is_empty());
    }

    #[test]
    fn test_unparseable_xaddr_skipped() {
        let xml = probe_matches(
            r#"<d:ProbeMatch><d:XAddrs>not-a-url</d:XAddrs></d:ProbeMatch>"#,
        );
        assert!(parse_datagram(xml.as_bytes()).is_empty());
    }
}
