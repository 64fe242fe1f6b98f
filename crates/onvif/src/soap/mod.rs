// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP marshaling layer underlying every device call.
//!
//! ```text
//! Message --> build_envelope (+ UsernameToken) --> SoapTransport::post
//!                                                        |
//! Body <-- Normalizer <-- `<Op>Response` <-- Fault check <--+
//! ```

pub mod dispatcher;
pub mod envelope;
pub mod fault;
pub mod security;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use envelope::{build_envelope, xml_escape, Message};
pub use fault::Fault;
pub use security::{password_digest, UsernameToken};
pub use transport::{HttpResponse, HttpTransport, SoapTransport};

use crate::config::{
    DEVICE_SERVICE_PATH, MEDIA_SERVICE_PATH, NS_ONVIF_DEVICE, NS_ONVIF_MEDIA, NS_ONVIF_PTZ,
    PTZ_SERVICE_PATH,
};

/// ONVIF service an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Device management (`tds`).
    Device,
    /// Media (`trt`).
    Media,
    /// Pan-tilt-zoom (`tptz`).
    Ptz,
}

impl Service {
    /// Namespace prefix used in envelopes.
    pub fn prefix(self) -> &'static str {
        match self {
            Service::Device => "tds",
            Service::Media => "trt",
            Service::Ptz => "tptz",
        }
    }

    /// WSDL namespace URI.
    pub fn namespace(self) -> &'static str {
        match self {
            Service::Device => NS_ONVIF_DEVICE,
            Service::Media => NS_ONVIF_MEDIA,
            Service::Ptz => NS_ONVIF_PTZ,
        }
    }

    /// Conventional endpoint path on a device.
    pub fn default_path(self) -> &'static str {
        match self {
            Service::Device => DEVICE_SERVICE_PATH,
            Service::Media => MEDIA_SERVICE_PATH,
            Service::Ptz => PTZ_SERVICE_PATH,
        }
    }

    /// Conventional endpoint URL for `host:port`.
    pub fn default_endpoint(self, host: &str, port: u16) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}{}", host, port, self.default_path())
        } else {
            format!("http://{}:{}{}", host, port, self.default_path())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            Service::Device.default_endpoint("192.168.1.100", 80),
            "http://192.168.1.100:80/onvif/device_service"
        );
        assert_eq!(
            Service::Ptz.default_endpoint("fe80::1", 8080),
            "http://[fe80::1]:8080/onvif/ptz_service"
        );
    }
}
