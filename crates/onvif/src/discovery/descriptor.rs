// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovered device snapshot.

use crate::config::DEVICE_SERVICE_PATH;

const ONVIF_SCOPE_SCHEME: &str = "onvif://";

/// One `{type, value}` pair decoded from an `onvif://` scope URI.
///
/// `onvif://www.onvif.org/name/Cam1` decodes to `name` / `Cam1`;
/// `onvif://www.onvif.org/location/country/france` to
/// `location` / `country/france`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    /// First path segment (`name`, `hardware`, `location`, `type`, `Profile`...).
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub scope_type: String,
    /// Remaining path segments joined with `/`, left percent-encoded.
    pub value: String,
}

impl Scope {
    /// Decode a scope URI. Non-ONVIF schemes and URIs with fewer than two
    /// path segments yield `None`.
    pub fn parse(uri: &str) -> Option<Self> {
        let head = uri.get(..ONVIF_SCOPE_SCHEME.len())?;
        if !head.eq_ignore_ascii_case(ONVIF_SCOPE_SCHEME) {
            return None;
        }
        let rest = &uri[ONVIF_SCOPE_SCHEME.len()..];

        // First segment is the authority (www.onvif.org).
        let mut segments = rest.split('/').skip(1).filter(|s| !s.is_empty());
        let scope_type = segments.next()?;
        let value: Vec<&str> = segments.collect();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            scope_type: scope_type.to_string(),
            value: value.join("/"),
        })
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.scope_type, self.value)
    }
}

/// A device that answered a probe.
///
/// Immutable snapshot of one ProbeMatch; not a live handle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDescriptor {
    /// Host of the first XAddr (IP literal or name).
    pub address: String,
    /// Port of the first XAddr, 80 when the URL has none.
    pub port: u16,
    /// Every advertised XAddr, in advertised order. Never empty.
    pub service_addresses: Vec<String>,
    /// Advertised type tokens (`dn:NetworkVideoTransmitter`, `tds:Device`...).
    pub types: Vec<String>,
    /// Decoded ONVIF scopes, in advertised order.
    pub scopes: Vec<Scope>,
    /// `EndpointReference/Address`, usually a `urn:uuid:`.
    pub endpoint_reference: Option<String>,
}

impl DeviceDescriptor {
    /// URL of the device management service.
    ///
    /// The first XAddr is the device service by definition of WS-Discovery
    /// for ONVIF; falls back to the conventional path on `address:port`.
    pub fn device_service_url(&self) -> String {
        match self.service_addresses.first() {
            Some(url) => url.clone(),
            None => format!("http://{}:{}{}", self.address, self.port, DEVICE_SERVICE_PATH),
        }
    }

    /// First scope value of `scope_type`.
    pub fn scope(&self, scope_type: &str) -> Option<&str> {
        self.scopes
            .iter()
            .find(|s| s.scope_type == scope_type)
            .map(|s| s.value.as_str())
    }

    /// Every scope value of `scope_type`.
    pub fn scopes_of<'a>(&'a self, scope_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.scopes
            .iter()
            .filter(move |s| s.scope_type == scope_type)
            .map(|s| s.value.as_str())
    }

    /// `name` scope.
    pub fn name(&self) -> Option<&str> {
        self.scope("name")
    }

    /// `hardware` scope.
    pub fn hardware(&self) -> Option<&str> {
        self.scope("hardware")
    }

    /// `location` scope.
    pub fn location(&self) -> Option<&str> {
        self.scope("location")
    }

    /// Whether `token` is among the advertised types. The namespace prefix
    /// is ignored (`dn:NetworkVideoTransmitter` matches `NetworkVideoTransmitter`).
    pub fn has_type(&self, token: &str) -> bool {
        let local = |t: &str| t.rsplit(':').next().unwrap_or(t).to_string();
        let wanted = local(token);
        self.types.iter().any(|t| local(t) == wanted)
    }
}
