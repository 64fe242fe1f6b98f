// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ONVIF global configuration.
//!
//! - **Static**: protocol constants (WS-Discovery group/port, XML namespaces,
//!   default service paths). Never hardcode them elsewhere.
//! - **Dynamic**: [`DiscoveryConfig`] and [`ClientConfig`]. Their `Default`
//!   implementations (and [`DiscoveryConfig::from_env`]) honour environment
//!   overrides; [`DiscoveryConfig::new`] and [`crate::discover`] do not.
//!
//! # Environment Variables
//!
//! - `ONVIF_DISCOVERY_TIMEOUT_MS`: discovery window (default: 3000)
//! - `ONVIF_BIND_ADDR`: local interface for the discovery socket (default: "0.0.0.0")
//! - `ONVIF_MULTICAST_IF`: force a single interface for the multicast join
//! - `ONVIF_REPROBE_MS`: re-send the probe every N ms within the window (default: off)
//! - `ONVIF_USERNAME` / `ONVIF_PASSWORD`: WS-Security credentials
//! - `ONVIF_HTTP_TIMEOUT_MS`: per-request HTTP timeout (default: 10000)

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

// =======================================================================
// WS-Discovery (WS-Discovery 2005/04, ONVIF Core Sec.7.3)
// =======================================================================

/// WS-Discovery IPv4 multicast group.
pub const WS_DISCOVERY_MULTICAST_IP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// WS-Discovery UDP port (IANA `ws-discovery`).
pub const WS_DISCOVERY_PORT: u16 = 3702;

/// Receive buffer for ProbeMatch datagrams (scopes make them large).
pub const DISCOVERY_RECV_BUFFER_SIZE: usize = 65536;

/// Port assumed when an XAddr carries neither a port nor a known scheme.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Type probed for when the caller does not override it.
pub const DEFAULT_PROBE_TYPES: &str = "wsdp:Device";

/// Default discovery window.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Default HTTP timeout for a single SOAP call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// =======================================================================
// XML namespaces
// =======================================================================

/// SOAP 1.2 envelope.
pub const NS_SOAP_ENV: &str = "http://www.w3.org/2003/05/soap-envelope";
/// WS-Addressing (2004/08, as used by WS-Discovery 2005/04).
pub const NS_WS_ADDRESSING: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
/// WS-Discovery 2005/04.
pub const NS_WS_DISCOVERY: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";
/// Devices Profile for Web Services (`wsdp:Device`).
pub const NS_DPWS: &str = "http://schemas.xmlsoap.org/ws/2006/02/devprof";
/// ONVIF network WSDL (`dn:NetworkVideoTransmitter`).
pub const NS_ONVIF_NETWORK: &str = "http://www.onvif.org/ver10/network/wsdl";
/// WS-Discovery `To` address for multicast probes.
pub const WS_DISCOVERY_TO: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";
/// WS-Discovery Probe action.
pub const WS_DISCOVERY_PROBE_ACTION: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";

/// WS-Security secext.
pub const NS_WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
/// WS-Security utility.
pub const NS_WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
/// UsernameToken password type for digest mode.
pub const WSSE_PASSWORD_DIGEST: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
/// Nonce encoding type.
pub const WSSE_BASE64_BINARY: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// ONVIF common schema (`tt`).
pub const NS_ONVIF_SCHEMA: &str = "http://www.onvif.org/ver10/schema";
/// ONVIF device management (`tds`).
pub const NS_ONVIF_DEVICE: &str = "http://www.onvif.org/ver10/device/wsdl";
/// ONVIF media (`trt`).
pub const NS_ONVIF_MEDIA: &str = "http://www.onvif.org/ver10/media/wsdl";
/// ONVIF PTZ (`tptz`).
pub const NS_ONVIF_PTZ: &str = "http://www.onvif.org/ver20/ptz/wsdl";

// =======================================================================
// Service endpoints
// =======================================================================

/// Conventional device service path.
pub const DEVICE_SERVICE_PATH: &str = "/onvif/device_service";
/// Conventional media service path.
pub const MEDIA_SERVICE_PATH: &str = "/onvif/media_service";
/// Conventional PTZ service path.
pub const PTZ_SERVICE_PATH: &str = "/onvif/ptz_service";

fn env_millis(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Settings for one [`crate::discovery::discover_with`] run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Wall-clock budget of the receive loop. Sole termination condition.
    pub timeout: Duration,

    /// Local interface address the socket binds to (port is always ephemeral).
    pub bind_address: String,

    /// Probe destination. Multicast targets also trigger a group join;
    /// unicast targets send a directed probe.
    pub target: SocketAddr,

    /// Value of `wsd:Types` in the probe.
    pub probe_types: String,

    /// Multicast TTL for the probe datagram.
    pub multicast_ttl: u32,

    /// Re-send the probe at this interval while the window is open.
    pub reprobe_interval: Option<Duration>,

    /// Interface override for the multicast join.
    pub multicast_interface: Option<Ipv4Addr>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl DiscoveryConfig {
    /// Create a config with an explicit window and bind address.
    ///
    /// Every other field takes its protocol default; the environment is
    /// not consulted.
    pub fn new(timeout: Duration, bind_address: impl Into<String>) -> Self {
        Self {
            timeout,
            bind_address: bind_address.into(),
            target: SocketAddr::V4(SocketAddrV4::new(
                WS_DISCOVERY_MULTICAST_IP,
                WS_DISCOVERY_PORT,
            )),
            probe_types: DEFAULT_PROBE_TYPES.to_string(),
            multicast_ttl: 1,
            reprobe_interval: None,
            multicast_interface: None,
        }
    }

    /// Protocol defaults overridden by the `ONVIF_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            env_millis("ONVIF_DISCOVERY_TIMEOUT_MS").unwrap_or(DEFAULT_DISCOVERY_TIMEOUT),
            std::env::var("ONVIF_BIND_ADDR").unwrap_or_else(|_| Ipv4Addr::UNSPECIFIED.to_string()),
        );
        config.reprobe_interval = env_millis("ONVIF_REPROBE_MS").filter(|d| !d.is_zero());
        config.multicast_interface = std::env::var("ONVIF_MULTICAST_IF")
            .ok()
            .and_then(|s| s.trim().parse().ok());
        config
    }

    /// Set the discovery window.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the local bind address.
    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.bind_address = bind_address.into();
        self
    }

    /// Send the probe somewhere other than the WS-Discovery group.
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    /// Probe for another type, e.g. `dn:NetworkVideoTransmitter`.
    pub fn with_probe_types(mut self, types: impl Into<String>) -> Self {
        self.probe_types = types.into();
        self
    }

    /// Re-send the probe periodically inside the window.
    pub fn with_reprobe_interval(mut self, interval: Duration) -> Self {
        self.reprobe_interval = Some(interval).filter(|d| !d.is_zero());
        self
    }

    /// Join the group on this interface only.
    pub fn with_multicast_interface(mut self, iface: Ipv4Addr) -> Self {
        self.multicast_interface = Some(iface);
        self
    }

    /// Set the multicast TTL.
    pub fn with_multicast_ttl(mut self, ttl: u32) -> Self {
        self.multicast_ttl = ttl;
        self
    }
}

/// WS-Security UsernameToken credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Clear-text password; only its digest goes on the wire.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings shared by the Device/Media/PTZ clients of one camera.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Credentials; `None` sends requests without a security header.
    pub credentials: Option<Credentials>,
    /// Timeout of a single HTTP exchange.
    pub http_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let credentials = match (
            std::env::var("ONVIF_USERNAME"),
            std::env::var("ONVIF_PASSWORD"),
        ) {
            (Ok(user), Ok(pass)) if !user.is_empty() => Some(Credentials::new(user, pass)),
            (Ok(user), Err(_)) if !user.is_empty() => Some(Credentials::new(user, "")),
            _ => None,
        };
        Self {
            credentials,
            http_timeout: env_millis("ONVIF_HTTP_TIMEOUT_MS").unwrap_or(DEFAULT_HTTP_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Config with explicit credentials.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials::new(username, password)),
            ..Default::default()
        }
    }

    /// Set the HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_is_ws_discovery_group() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.target.to_string(), "239.255.255.250:3702");
        assert_eq!(config.probe_types, "wsdp:Device");
    }

    #[test]
    fn test_builder_methods() {
        let config = DiscoveryConfig::new(Duration::from_millis(250), "127.0.0.1")
            .with_probe_types("dn:NetworkVideoTransmitter")
            .with_reprobe_interval(Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.probe_types, "dn:NetworkVideoTransmitter");
        assert!(config.reprobe_interval.is_none());
    }

    #[test]
    fn test_new_ignores_environment() {
        std::env::set_var("ONVIF_REPROBE_MS", "250");
        std::env::set_var("ONVIF_MULTICAST_IF", "10.1.2.3");
        let explicit = DiscoveryConfig::new(Duration::from_secs(1), "0.0.0.0");
        let from_env = DiscoveryConfig::from_env();
        std::env::remove_var("ONVIF_REPROBE_MS");
        std::env::remove_var("ONVIF_MULTICAST_IF");

        assert!(explicit.reprobe_interval.is_none());
        assert!(explicit.multicast_interface.is_none());
        assert_eq!(from_env.reprobe_interval, Some(Duration::from_millis(250)));
        assert_eq!(
            from_env.multicast_interface,
            Some(Ipv4Addr::new(10, 1, 2, 3))
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("admin", "hunter2");
        let dbg = format!("{:?}", creds);
        assert!(dbg.contains("admin"));
        assert!(!dbg.contains("hunter2"));
    }
}
