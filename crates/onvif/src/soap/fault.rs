// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP fault extraction and classification.

use crate::error::Error;
use roxmltree::Node;

/// Text marking a credential rejection in a fault.
const AUTH_REJECTION_MARKER: &str = "Unauthorized";

/// A SOAP fault as found in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Code value followed by subcode values, space separated.
    pub code: String,
    /// Reason text (first `Reason/Text`, or SOAP 1.1 `faultstring`).
    pub message: String,
}

impl Fault {
    /// Extract a fault from a `Fault` element (SOAP 1.2 or 1.1 layout).
    pub fn from_node(fault: Node<'_, '_>) -> Self {
        // SOAP 1.2: Code/Value, Code/Subcode/Value..., Reason/Text
        let mut codes = Vec::new();
        let mut code_node = child(fault, "Code");
        while let Some(node) = code_node {
            let value = text(child(node, "Value"));
            if !value.is_empty() {
                codes.push(value);
            }
            code_node = child(node, "Subcode");
        }
        let mut message = text(child(fault, "Reason").and_then(|r| child(r, "Text")));

        // SOAP 1.1 fallback
        if codes.is_empty() {
            let value = text(child(fault, "faultcode"));
            if !value.is_empty() {
                codes.push(value);
            }
        }
        if message.is_empty() {
            message = text(child(fault, "faultstring"));
        }

        Self {
            code: codes.join(" "),
            message,
        }
    }

    /// Whether the fault is a credential rejection.
    pub fn is_authentication_rejection(&self) -> bool {
        self.message.contains(AUTH_REJECTION_MARKER) || self.code.contains(AUTH_REJECTION_MARKER)
    }

    /// Classify into the public taxonomy.
    pub fn into_error(self) -> Error {
        if self.is_authentication_rejection() {
            Error::AuthenticationFailure(self.message)
        } else {
            Error::ProtocolFault {
                code: self.code,
                message: self.message,
            }
        }
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn text(node: Option<Node<'_, '_>>) -> String {
    node.and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Find a `Fault` element anywhere under `root`.
pub fn find_fault<'a, 'input>(root: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    root.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "Fault")
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_soap12_fault_with_subcodes() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"
                        xmlns:ter="http://www.onvif.org/ver10/error">
            <env:Body><env:Fault>
              <env:Code><env:Value>env:Receiver</env:Value>
                <env:Subcode><env:Value>ter:ActionNotSupported</env:Value>
                  <env:Subcode><env:Value>ter:AudioNotSupported</env:Value></env:Subcode>
                </env:Subcode>
              </env:Code>
              <env:Reason><env:Text xml:lang="en">Audio is not supported</env:Text></env:Reason>
            </env:Fault></env:Body></env:Envelope>"#;
        let doc = Document::parse(xml).unwrap();
        let fault = Fault::from_node(find_fault(doc.root()).unwrap());
        assert_eq!(
            fault.code,
            "env:Receiver ter:ActionNotSupported ter:AudioNotSupported"
        );
        assert_eq!(fault.message, "Audio is not supported");
        assert!(matches!(fault.into_error(), Error::ProtocolFault { .. }));
    }

    #[test]
    fn test_unauthorized_classifies_as_authentication() {
        let xml = r#"<Envelope><Body><Fault>
              <Code><Value>Sender</Value></Code>
              <Reason><Text>Unauthorized</Text></Reason>
            </Fault></Body></Envelope>"#;
        let doc = Document::parse(xml).unwrap();
        let err = Fault::from_node(find_fault(doc.root()).unwrap()).into_error();
        assert!(matches!(err, Error::AuthenticationFailure(ref m) if m == "Unauthorized"));
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let fault = Fault {
            code: "env:Sender".into(),
            message: "unauthorized access".into(),
        };
        assert!(!fault.is_authentication_rejection());
    }

    #[test]
    fn test_soap11_fault() {
        let xml = r#"<Envelope><Body><Fault>
              <faultcode>Client</faultcode><faultstring>Bad request</faultstring>
            </Fault></Body></Envelope>"#;
        let doc = Document::parse(xml).unwrap();
        let fault = Fault::from_node(find_fault(doc.root()).unwrap());
        assert_eq!(fault.code, "Client");
        assert_eq!(fault.message, "Bad request");
    }
}
