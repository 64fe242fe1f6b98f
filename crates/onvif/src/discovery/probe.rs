// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! WS-Discovery Probe message.

use crate::config::{
    NS_DPWS, NS_ONVIF_NETWORK, NS_SOAP_ENV, NS_WS_ADDRESSING, NS_WS_DISCOVERY,
    WS_DISCOVERY_PROBE_ACTION, WS_DISCOVERY_TO,
};
use crate::soap::xml_escape;
use uuid::Uuid;

/// One Probe request.
///
/// The MessageID only correlates replies at the protocol level and is not
/// retained by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    message_id: String,
    types: String,
}

impl Probe {
    /// Probe for `types` (e.g. `wsdp:Device`) with a fresh `uuid:` MessageID.
    pub fn new(types: &str) -> Self {
        Self {
            message_id: format!("uuid:{}", Uuid::new_v4()),
            types: types.to_string(),
        }
    }

    /// `wsa:MessageID` value.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Render the SOAP 1.2 envelope.
    pub fn to_xml(&self) -> String {
        let mut types = String::new();
        if !self.types.trim().is_empty() {
            types = format!("<wsd:Types>{}</wsd:Types>", xml_escape(self.types.trim()));
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<s:Envelope xmlns:s="{soap}" xmlns:wsa="{wsa}" xmlns:wsd="{wsd}" xmlns:wsdp="{wsdp}" xmlns:dn="{dn}">"#,
                "<s:Header>",
                "<wsa:Action>{action}</wsa:Action>",
                "<wsa:MessageID>{id}</wsa:MessageID>",
                "<wsa:To>{to}</wsa:To>",
                "</s:Header>",
                "<s:Body><wsd:Probe>{types}</wsd:Probe></s:Body>",
                "</s:Envelope>"
            ),
            soap = NS_SOAP_ENV,
            wsa = NS_WS_ADDRESSING,
            wsd = NS_WS_DISCOVERY,
            wsdp = NS_DPWS,
            dn = NS_ONVIF_NETWORK,
            action = WS_DISCOVERY_PROBE_ACTION,
            id = self.message_id,
            to = WS_DISCOVERY_TO,
            types = types,
        )
    }
}
