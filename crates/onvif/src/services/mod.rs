// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed wrappers over the Device, Media and PTZ services.
//!
//! Each wrapper builds the operation's [`Message`](crate::soap::Message),
//! hands it to a [`Dispatcher`](crate::soap::Dispatcher) and projects the
//! normalized [`Body`] into a result type. Failures propagate unchanged,
//! except for the two audio queries of [`MediaClient`] which treat an
//! unsupported action as "no audio".

pub mod device;
pub mod media;
pub mod ptz;

pub use device::{
    CapabilityCategory, Capabilities, DeviceClient, DeviceInformation, DnsInformation, Hostname,
    IpAddress, NetworkInterface, NetworkProtocol, OnvifVersion, PrefixedAddress, ServiceEntry,
    SystemDateTime,
};
pub use media::{
    AudioEncoderConfiguration, AudioSource, Bounds, MediaClient, MediaUri, Profile, Resolution,
    StreamType, TransportProtocol, VideoEncoderConfiguration, VideoSource,
    VideoSourceConfiguration,
};
pub use ptz::{Preset, PtzClient, PtzConfiguration, PtzStatus, PtzVector, Vector1D, Vector2D};

use crate::normalize::Body;

/// Trimmed text of `key`, empty when absent.
pub(crate) fn text_or_default(body: &Body, key: &str) -> String {
    body.string(key).unwrap_or_default()
}

/// Trimmed attribute, empty when absent.
pub(crate) fn attr_or_default(body: &Body, name: &str) -> String {
    body.attr(name).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Non-negative integer child.
pub(crate) fn uint(body: &Body, key: &str) -> Option<u32> {
    body.i64(key).and_then(|v| u32::try_from(v).ok())
}

/// Non-empty trimmed text of `key`.
pub(crate) fn non_empty(body: &Body, key: &str) -> Option<String> {
    body.string(key).filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport answering by SOAP action.

    use crate::error::{Error, Result};
    use crate::soap::{HttpResponse, SoapTransport};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<HashMap<String, (u16, String)>>,
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Answer `operation` with a 200 envelope wrapping `body_xml`.
        pub fn reply(&self, operation: &str, body_xml: &str) {
            self.reply_status(operation, 200, &envelope(body_xml));
        }

        /// Answer `operation` with a fault carrying `code` and `reason`.
        pub fn fault(&self, operation: &str, code: &str, reason: &str) {
            let xml = envelope(&format!(
                "<env:Fault><env:Code><env:Value>env:Receiver</env:Value>\
                 <env:Subcode><env:Value>{}</env:Value></env:Subcode></env:Code>\
                 <env:Reason><env:Text xml:lang=\"en\">{}</env:Text></env:Reason></env:Fault>",
                code, reason
            ));
            self.reply_status(operation, 500, &xml);
        }

        pub fn reply_status(&self, operation: &str, status: u16, raw: &str) {
            self.replies
                .lock()
                .unwrap()
                .insert(operation.to_string(), (status, raw.to_string()));
        }

        /// Last envelope sent for `operation`.
        pub fn last_request(&self, operation: &str) -> String {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(action, _)| action.ends_with(&format!("/{}", operation)))
                .map(|(_, envelope)| envelope.clone())
                .unwrap_or_default()
        }
    }

    impl SoapTransport for ScriptedTransport {
        fn post(&self, _endpoint: &str, action: &str, envelope: String) -> Result<HttpResponse> {
            self.sent
                .lock()
                .unwrap()
                .push((action.to_string(), envelope));
            let operation = action.rsplit('/').next().unwrap_or_default();
            match self.replies.lock().unwrap().get(operation) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(Error::ConnectionFailure(format!("no reply scripted for {}", operation))),
            }
        }
    }

    pub fn envelope(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
    xmlns:tt="http://www.onvif.org/ver10/schema"
    xmlns:tds="http://www.onvif.org/ver10/device/wsdl"
    xmlns:trt="http://www.onvif.org/ver10/media/wsdl"
    xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl"
    xmlns:ter="http://www.onvif.org/ver10/error">
  <env:Body>{}</env:Body>
</env:Envelope>"#,
            inner
        )
    }
}
