// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device management service (`tds`).

use super::{attr_or_default, non_empty, text_or_default, uint};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::normalize::Body;
use crate::soap::{Dispatcher, Message, Service};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// `GetDeviceInformation` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceInformation {
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub hardware_id: String,
}

impl From<&Body> for DeviceInformation {
    fn from(body: &Body) -> Self {
        Self {
            manufacturer: text_or_default(body, "manufacturer"),
            model: text_or_default(body, "model"),
            firmware_version: text_or_default(body, "firmware_version"),
            serial_number: text_or_default(body, "serial_number"),
            hardware_id: text_or_default(body, "hardware_id"),
        }
    }
}

/// `Category` argument of `GetCapabilities`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CapabilityCategory {
    #[default]
    All,
    Analytics,
    Device,
    Events,
    Imaging,
    Media,
    Ptz,
}

impl CapabilityCategory {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityCategory::All => "All",
            CapabilityCategory::Analytics => "Analytics",
            CapabilityCategory::Device => "Device",
            CapabilityCategory::Events => "Events",
            CapabilityCategory::Imaging => "Imaging",
            CapabilityCategory::Media => "Media",
            CapabilityCategory::Ptz => "PTZ",
        }
    }

    fn key(self) -> &'static str {
        match self {
            CapabilityCategory::All => "",
            CapabilityCategory::Analytics => "analytics",
            CapabilityCategory::Device => "device",
            CapabilityCategory::Events => "events",
            CapabilityCategory::Imaging => "imaging",
            CapabilityCategory::Media => "media",
            CapabilityCategory::Ptz => "ptz",
        }
    }
}

impl std::fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `GetCapabilities` result.
///
/// Only the service addresses are projected; everything else stays in
/// [`Capabilities::raw`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Capabilities {
    /// Normalized `Capabilities` element.
    pub raw: Body,
}

impl Capabilities {
    /// Service address advertised for `category`.
    pub fn xaddr(&self, category: CapabilityCategory) -> Option<&str> {
        self.raw
            .map(category.key())
            .and_then(|c| c.text("x_addr"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Category section, if the device reported it.
    pub fn section(&self, category: CapabilityCategory) -> Option<&Body> {
        self.raw.map(category.key())
    }

    /// Device management service address.
    pub fn device_xaddr(&self) -> Option<&str> {
        self.xaddr(CapabilityCategory::Device)
    }

    /// Media service address.
    pub fn media_xaddr(&self) -> Option<&str> {
        self.xaddr(CapabilityCategory::Media)
    }

    /// PTZ service address.
    pub fn ptz_xaddr(&self) -> Option<&str> {
        self.xaddr(CapabilityCategory::Ptz)
    }
}

/// Interface version of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OnvifVersion {
    pub major: u32,
    pub minor: u32,
}

impl std::fmt::Display for OnvifVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// One entry of `GetServices`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ServiceEntry {
    pub namespace: String,
    pub xaddr: String,
    pub version: Option<OnvifVersion>,
    /// Present when requested with `include_capability`.
    pub capabilities: Option<Body>,
}

impl From<&Body> for ServiceEntry {
    fn from(body: &Body) -> Self {
        let version = body.map("version").map(|v| OnvifVersion {
            major: uint(v, "major").unwrap_or_default(),
            minor: uint(v, "minor").unwrap_or_default(),
        });
        Self {
            namespace: text_or_default(body, "namespace"),
            xaddr: text_or_default(body, "x_addr"),
            version,
            capabilities: body.map("capabilities").cloned(),
        }
    }
}

/// `GetSystemDateAndTime` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SystemDateTime {
    /// `Manual` or `NTP`.
    pub date_time_type: String,
    /// Whether daylight saving time is in effect.
    pub daylight_savings: bool,
    /// POSIX TZ string.
    pub time_zone: Option<String>,
    /// Device clock in UTC.
    pub utc: Option<NaiveDateTime>,
    /// Device clock in its local time zone.
    pub local: Option<NaiveDateTime>,
}

impl SystemDateTime {
    /// Device UTC clock minus `now`. `None` when the device omitted its UTC time.
    pub fn clock_offset(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.utc.map(|utc| utc.and_utc() - now)
    }
}

fn date_time(body: &Body) -> Option<NaiveDateTime> {
    let date = body.map("date")?;
    let time = body.map("time")?;
    let day = NaiveDate::from_ymd_opt(
        i32::try_from(date.i64("year")?).ok()?,
        uint(date, "month")?,
        uint(date, "day")?,
    )?;
    day.and_hms_opt(uint(time, "hour")?, uint(time, "minute")?, uint(time, "second")?)
}

impl From<&Body> for SystemDateTime {
    fn from(body: &Body) -> Self {
        Self {
            date_time_type: text_or_default(body, "date_time_type"),
            daylight_savings: body.bool("daylight_savings").unwrap_or(false),
            time_zone: body
                .map("time_zone")
                .and_then(|tz| non_empty(tz, "tz")),
            utc: body.map("utc_date_time").and_then(date_time),
            local: body.map("local_date_time").and_then(date_time),
        }
    }
}

/// Address with prefix length.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrefixedAddress {
    pub address: String,
    pub prefix_length: u32,
}

impl From<&Body> for PrefixedAddress {
    fn from(body: &Body) -> Self {
        Self {
            address: text_or_default(body, "address"),
            prefix_length: uint(body, "prefix_length").unwrap_or_default(),
        }
    }
}

/// One entry of `GetNetworkInterfaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NetworkInterface {
    pub token: String,
    pub enabled: bool,
    pub name: Option<String>,
    /// MAC address.
    pub hw_address: Option<String>,
    pub mtu: Option<u32>,
    pub ipv4_enabled: bool,
    pub ipv4_dhcp: bool,
    /// Manual addresses, then the DHCP-assigned one.
    pub ipv4_addresses: Vec<PrefixedAddress>,
}

impl From<&Body> for NetworkInterface {
    fn from(body: &Body) -> Self {
        let info = body.map("info");
        let ipv4 = body.map("ipv4");
        let config = ipv4.and_then(|v| v.map("config"));

        let mut ipv4_addresses: Vec<PrefixedAddress> = config
            .map(|c| c.maps("manual").into_iter().map(PrefixedAddress::from).collect())
            .unwrap_or_default();
        if let Some(dhcp) = config.and_then(|c| c.map("from_dhcp")) {
            ipv4_addresses.push(PrefixedAddress::from(dhcp));
        }

        Self {
            token: attr_or_default(body, "token"),
            enabled: body.bool("enabled").unwrap_or(false),
            name: info.and_then(|i| non_empty(i, "name")),
            hw_address: info.and_then(|i| non_empty(i, "hw_address")),
            mtu: info.and_then(|i| uint(i, "mtu")),
            ipv4_enabled: ipv4.and_then(|v| v.bool("enabled")).unwrap_or(false),
            ipv4_dhcp: config.and_then(|c| c.bool("dhcp")).unwrap_or(false),
            ipv4_addresses,
        }
    }
}

/// `GetHostname` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Hostname {
    pub from_dhcp: bool,
    pub name: Option<String>,
}

/// DNS server address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IpAddress {
    /// `IPv4` or `IPv6`.
    pub address_type: String,
    pub address: String,
}

impl From<&Body> for IpAddress {
    fn from(body: &Body) -> Self {
        let address = non_empty(body, "ipv4_address")
            .or_else(|| non_empty(body, "ipv6_address"))
            .unwrap_or_default();
        Self {
            address_type: text_or_default(body, "type"),
            address,
        }
    }
}

/// `GetDNS` result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DnsInformation {
    pub from_dhcp: bool,
    /// DNS search domains, in reported order.
    pub search_domains: Vec<String>,
    /// Servers learned from DHCP.
    pub dns_from_dhcp: Vec<IpAddress>,
    /// Statically configured servers.
    pub dns_manual: Vec<IpAddress>,
}

impl From<&Body> for DnsInformation {
    fn from(body: &Body) -> Self {
        let addresses = |key: &str| -> Vec<IpAddress> {
            body.maps(key).into_iter().map(IpAddress::from).collect()
        };
        Self {
            from_dhcp: body.bool("from_dhcp").unwrap_or(false),
            search_domains: body
                .texts("search_domain")
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            dns_from_dhcp: addresses("dns_from_dhcp"),
            dns_manual: addresses("dns_manual"),
        }
    }
}

/// One entry of `GetNetworkProtocols`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NetworkProtocol {
    /// `HTTP`, `HTTPS` or `RTSP`.
    pub name: String,
    pub enabled: bool,
    /// Listening ports, in reported order.
    pub ports: Vec<u16>,
}

impl From<&Body> for NetworkProtocol {
    fn from(body: &Body) -> Self {
        Self {
            name: text_or_default(body, "name"),
            enabled: body.bool("enabled").unwrap_or(false),
            ports: body
                .texts("port")
                .into_iter()
                .filter_map(|p| p.trim().parse().ok())
                .collect(),
        }
    }
}

/// Client for the device management service.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    dispatcher: Dispatcher,
}

impl DeviceClient {
    /// Client over HTTP for `endpoint` (e.g. `http://host/onvif/device_service`).
    pub fn new(endpoint: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_dispatcher(Dispatcher::new(
            endpoint,
            Service::Device,
            config,
        )?))
    }

    /// Client over an existing dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutable dispatcher, to re-bind the endpoint or clock offset.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Manufacturer, model, firmware, serial number and hardware id.
    pub fn get_device_information(&self) -> Result<DeviceInformation> {
        let body = self.dispatcher.call("GetDeviceInformation", None)?;
        Ok(DeviceInformation::from(&body))
    }

    /// Capabilities of `category`, including per-service XAddrs.
    pub fn get_capabilities(&self, category: CapabilityCategory) -> Result<Capabilities> {
        let msg = Message::new("tds").field("category", category);
        let body = self.dispatcher.call("GetCapabilities", Some(&msg))?;
        Ok(Capabilities {
            raw: body.map("capabilities").cloned().unwrap_or_default(),
        })
    }

    /// Every service the device exposes, in reported order.
    pub fn get_services(&self, include_capability: bool) -> Result<Vec<ServiceEntry>> {
        let msg = Message::new("tds").field("include_capability", include_capability);
        let body = self.dispatcher.call("GetServices", Some(&msg))?;
        Ok(body.maps("service").into_iter().map(ServiceEntry::from).collect())
    }

    /// Device clock and time zone settings.
    pub fn get_system_date_time(&self) -> Result<SystemDateTime> {
        let body = self.dispatcher.call("GetSystemDateAndTime", None)?;
        Ok(body
            .map("system_date_and_time")
            .map(SystemDateTime::from)
            .unwrap_or_default())
    }

    /// Every network interface, in reported order.
    pub fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        let body = self.dispatcher.call("GetNetworkInterfaces", None)?;
        Ok(body
            .maps("network_interfaces")
            .into_iter()
            .map(NetworkInterface::from)
            .collect())
    }

    /// Hostname and whether it comes from DHCP.
    pub fn get_hostname(&self) -> Result<Hostname> {
        let body = self.dispatcher.call("GetHostname", None)?;
        let info = body.map("hostname_information");
        Ok(Hostname {
            from_dhcp: info.and_then(|i| i.bool("from_dhcp")).unwrap_or(false),
            name: info.and_then(|i| non_empty(i, "name")),
        })
    }

    /// DNS configuration.
    pub fn get_dns(&self) -> Result<DnsInformation> {
        let body = self.dispatcher.call("GetDNS", None)?;
        Ok(body
            .map("dns_information")
            .map(DnsInformation::from)
            .unwrap_or_default())
    }

    /// HTTP, HTTPS and RTSP enablement and ports.
    pub fn get_network_protocols(&self) -> Result<Vec<NetworkProtocol>> {
        let body = self.dispatcher.call("GetNetworkProtocols", None)?;
        Ok(body
            .maps("network_protocols")
            .into_iter()
            .map(NetworkProtocol::from)
            .collect())
    }

    /// Reboot the device. Returns the device's message (e.g. expected downtime).
    pub fn system_reboot(&self) -> Result<String> {
        let body = self.dispatcher.call("SystemReboot", None)?;
        log::info!("[SOAP] reboot requested on {}", self.dispatcher.endpoint());
        Ok(text_or_default(&body, "message"))
    }
}
