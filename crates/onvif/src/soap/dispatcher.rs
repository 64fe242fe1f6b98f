// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP request dispatcher.
//!
//! One call = one authenticated envelope POSTed to one endpoint, and one
//! classified outcome:
//!
//! | Response                                   | Outcome                              |
//! |--------------------------------------------|--------------------------------------|
//! | network failure                            | [`Error::ConnectionFailure`]         |
//! | SOAP fault mentioning `Unauthorized`       | [`Error::AuthenticationFailure`]     |
//! | any other SOAP fault                       | [`Error::ProtocolFault`]             |
//! | non-2xx status without a fault             | [`Error::ConnectionFailure`]         |
//! | 2xx, well-formed envelope                  | `Ok(Body)` (normalized response)     |
//! | anything else                              | [`Error::UnexpectedFailure`]         |

use crate::config::{ClientConfig, Credentials};
use crate::error::{Error, Result};
use crate::normalize::{Body, Normalizer};
use crate::soap::envelope::{build_envelope, Message};
use crate::soap::fault::{find_fault, Fault};
use crate::soap::security::UsernameToken;
use crate::soap::transport::{HttpResponse, HttpTransport, SoapTransport};
use crate::soap::Service;
use roxmltree::{Document, Node};
use std::sync::Arc;

/// Authenticated caller for one service endpoint.
///
/// Not designed for concurrent use: callers sharing a dispatcher between
/// threads must serialize calls themselves.
#[derive(Clone)]
pub struct Dispatcher {
    endpoint: String,
    service: Service,
    credentials: Option<Credentials>,
    clock_offset: chrono::Duration,
    transport: Arc<dyn SoapTransport>,
    normalizer: Normalizer,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint)
            .field("service", &self.service)
            .field("credentials", &self.credentials)
            .field("clock_offset", &self.clock_offset)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatcher over the default HTTP transport.
    pub fn new(endpoint: impl Into<String>, service: Service, config: &ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.http_timeout)?);
        Ok(Self::with_transport(
            endpoint,
            service,
            config.credentials.clone(),
            transport,
        ))
    }

    /// Dispatcher over a caller-provided transport.
    pub fn with_transport(
        endpoint: impl Into<String>,
        service: Service,
        credentials: Option<Credentials>,
        transport: Arc<dyn SoapTransport>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            service,
            credentials,
            clock_offset: chrono::Duration::zero(),
            transport,
            normalizer: Normalizer::new(),
        }
    }

    /// Endpoint URL this dispatcher posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Service this dispatcher speaks to.
    pub fn service(&self) -> Service {
        self.service
    }

    /// Re-bind to another endpoint URL (e.g. an XAddr returned by the device).
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Offset added to the local clock when stamping `wsu:Created`.
    pub fn set_clock_offset(&mut self, offset: chrono::Duration) {
        self.clock_offset = offset;
    }

    /// Replace the normalizer (e.g. to declare vendor-specific repeatable elements).
    pub fn set_normalizer(&mut self, normalizer: Normalizer) {
        self.normalizer = normalizer;
    }

    /// Perform `operation` (wire name, e.g. `GetDeviceInformation`).
    ///
    /// Returns the normalized content of `<operation>Response`.
    pub fn call(&self, operation: &str, message: Option<&Message>) -> Result<Body> {
        let token = self
            .credentials
            .as_ref()
            .map(|c| UsernameToken::generate(c, self.clock_offset))
            .transpose()?;
        let envelope = build_envelope(self.service, operation, message, token.as_ref());
        let action = format!("{}/{}", self.service.namespace(), operation);

        log::debug!("[SOAP] {} -> {}", operation, self.endpoint);
        let response = self.transport.post(&self.endpoint, &action, envelope)?;

        let result = interpret(operation, &response, &self.normalizer);
        if let Err(ref e) = result {
            log::debug!("[SOAP] {} failed: {}", operation, e);
        }
        result
    }
}

/// Classify an HTTP response for `operation`.
pub(crate) fn interpret(
    operation: &str,
    response: &HttpResponse,
    normalizer: &Normalizer,
) -> Result<Body> {
    let doc = match Document::parse(&response.body) {
        Ok(doc) => doc,
        Err(e) if !response.is_success() => {
            return Err(Error::ConnectionFailure(format!(
                "HTTP {} (unparseable body: {})",
                response.status, e
            )));
        }
        Err(e) => {
            return Err(Error::UnexpectedFailure(format!(
                "malformed SOAP response: {}",
                e
            )))
        }
    };

    if let Some(fault) = find_fault(doc.root()) {
        return Err(Fault::from_node(fault).into_error());
    }

    if !response.is_success() {
        return Err(Error::ConnectionFailure(format!("HTTP {}", response.status)));
    }

    let body = doc
        .root_element()
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "Body")
        .ok_or_else(|| Error::UnexpectedFailure("response has no SOAP Body".into()))?;

    let expected = format!("{}Response", operation);
    let elements: Vec<Node<'_, '_>> = body.children().filter(Node::is_element).collect();
    let response_node = match elements
        .iter()
        .find(|n| n.tag_name().name() == expected)
    {
        Some(node) => *node,
        None => {
            let first = elements.first().ok_or_else(|| {
                Error::UnexpectedFailure(format!("empty SOAP Body, expected {}", expected))
            })?;
            log::debug!(
                "[SOAP] expected {} but got {}, using it",
                expected,
                first.tag_name().name()
            );
            *first
        }
    };

    Ok(normalizer.normalize(response_node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Mutex;

    struct CannedTransport {
        response: Result<HttpResponse>,
        requests: Mutex<Vec<(String, String, String)>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl SoapTransport for CannedTransport {
        fn post(&self, endpoint: &str, action: &str, envelope: String) -> Result<HttpResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((endpoint.into(), action.into(), envelope));
            match &self.response {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(Error::ConnectionFailure(e.to_string())),
            }
        }
    }

    fn envelope(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                  xmlns:tds="http://www.onvif.org/ver10/device/wsdl"><env:Body>{}</env:Body></env:Envelope>"#,
            inner
        )
    }

    fn fault(reason: &str) -> String {
        envelope(&format!(
            "<env:Fault><env:Code><env:Value>env:Sender</env:Value></env:Code>\
             <env:Reason><env:Text>{}</env:Text></env:Reason></env:Fault>",
            reason
        ))
    }

    fn dispatcher(transport: Arc<CannedTransport>) -> Dispatcher {
        Dispatcher::with_transport(
            "http://cam/onvif/device_service",
            Service::Device,
            Some(Credentials::new("admin", "pw")),
            transport,
        )
    }

    #[test]
    fn test_success_returns_normalized_response() {
        let body = envelope(
            "<tds:GetHostnameResponse><tds:HostnameInformation>\
             <tt:FromDHCP xmlns:tt=\"x\">false</tt:FromDHCP><tt:Name xmlns:tt=\"x\">cam1</tt:Name>\
             </tds:HostnameInformation></tds:GetHostnameResponse>",
        );
        let transport = CannedTransport::new(200, &body);
        let result = dispatcher(transport.clone()).call("GetHostname", None).unwrap();
        assert_eq!(
            result.path_text(&["hostname_information", "name"]),
            Some("cam1")
        );

        let requests = transport.requests.lock().unwrap();
        let (endpoint, action, sent) = &requests[0];
        assert_eq!(endpoint, "http://cam/onvif/device_service");
        assert_eq!(action, "http://www.onvif.org/ver10/device/wsdl/GetHostname");
        assert!(sent.contains("<tds:GetHostname/>"));
        assert!(sent.contains("wsse:UsernameToken"));
    }

    #[test]
    fn test_unauthorized_fault_is_authentication_failure() {
        for status in [200, 400, 401, 500] {
            let transport = CannedTransport::new(status, &fault("Unauthorized"));
            let err = dispatcher(transport)
                .call("GetDeviceInformation", None)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authentication, "status {}", status);
        }
    }

    #[test]
    fn test_other_fault_is_protocol_fault() {
        let transport = CannedTransport::new(500, &fault("Action not supported"));
        let err = dispatcher(transport).call("GetDNS", None).unwrap_err();
        match err {
            Error::ProtocolFault { code, message } => {
                assert_eq!(code, "env:Sender");
                assert_eq!(message, "Action not supported");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_http_error_without_fault_is_connection_failure() {
        let transport = CannedTransport::new(500, "Internal Server Error");
        let err = dispatcher(transport).call("GetDNS", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        let transport = CannedTransport::new(404, &envelope(""));
        let err = dispatcher(transport).call("GetDNS", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_garbage_success_is_unexpected() {
        let transport = CannedTransport::new(200, "<html><body>login</body");
        let err = dispatcher(transport).call("GetDNS", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);

        let transport = CannedTransport::new(200, "<Envelope><Header/></Envelope>");
        let err = dispatcher(transport).call("GetDNS", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_no_credentials_means_no_security_header() {
        let transport = CannedTransport::new(200, &envelope("<tds:SystemRebootResponse/>"));
        let d = Dispatcher::with_transport(
            "http://cam/onvif/device_service",
            Service::Device,
            None,
            transport.clone(),
        );
        d.call("SystemReboot", None).unwrap();
        let requests = transport.requests.lock().unwrap();
        assert!(!requests[0].2.contains("Security"));
    }
}
