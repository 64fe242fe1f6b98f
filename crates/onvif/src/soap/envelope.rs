// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SOAP 1.2 envelope construction and request message parameters.

use crate::config::{NS_ONVIF_DEVICE, NS_ONVIF_MEDIA, NS_ONVIF_PTZ, NS_ONVIF_SCHEMA, NS_SOAP_ENV};
use crate::normalize::upper_camel_case;
use crate::soap::security::UsernameToken;
use crate::soap::Service;

/// Escape text and attribute content.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Text(String),
    Children(Message),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    content: Content,
}

/// Parameters of one operation, rendered as the operation element's content.
///
/// Field names are given in snake_case and rendered as
/// `<prefix>:<UpperCamelCase>`; a name that already carries a `prefix:` is
/// used verbatim.
///
/// ```
/// use onvif::soap::Message;
///
/// let msg = Message::new("trt")
///     .field("profile_token", "main")
///     .nested(
///         "stream_setup",
///         Message::new("tt")
///             .field("stream", "RTP-Unicast")
///             .nested("transport", Message::new("tt").field("protocol", "RTSP")),
///     );
/// assert!(msg.to_xml().starts_with("<trt:ProfileToken>main</trt:ProfileToken>"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    prefix: String,
    attributes: Vec<(String, String)>,
    elements: Vec<Element>,
}

impl Message {
    /// Empty message whose fields default to `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            attributes: Vec::new(),
            elements: Vec::new(),
        }
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains(':') {
            name.to_string()
        } else {
            format!("{}:{}", self.prefix, upper_camel_case(name))
        }
    }

    /// Scalar field.
    pub fn field(mut self, name: &str, value: impl ToString) -> Self {
        let name = self.qualify(name);
        self.elements.push(Element {
            name,
            content: Content::Text(value.to_string()),
        });
        self
    }

    /// Scalar field, skipped when `None`.
    pub fn optional(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Nested mapping.
    pub fn nested(mut self, name: &str, message: Message) -> Self {
        let name = self.qualify(name);
        self.elements.push(Element {
            name,
            content: Content::Children(message),
        });
        self
    }

    /// Nested mapping, skipped when `None`.
    pub fn nested_optional(self, name: &str, message: Option<Message>) -> Self {
        match message {
            Some(m) => self.nested(name, m),
            None => self,
        }
    }

    /// Repeated scalar element, one per value.
    pub fn list<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let name = self.qualify(name);
        for v in values {
            self.elements.push(Element {
                name: name.clone(),
                content: Content::Text(v.to_string()),
            });
        }
        self
    }

    /// Repeated nested mapping, one element per message.
    pub fn nested_list<I>(mut self, name: &str, messages: I) -> Self
    where
        I: IntoIterator<Item = Message>,
    {
        let name = self.qualify(name);
        for message in messages {
            self.elements.push(Element {
                name: name.clone(),
                content: Content::Children(message),
            });
        }
        self
    }

    /// Attribute on the element this message is nested into.
    pub fn attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Whether the message renders nothing.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render the message content.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        for element in &self.elements {
            out.push('<');
            out.push_str(&element.name);
            match &element.content {
                Content::Text(text) => {
                    out.push('>');
                    out.push_str(&xml_escape(text));
                }
                Content::Children(child) => {
                    for (k, v) in &child.attributes {
                        out.push_str(&format!(" {}=\"{}\"", k, xml_escape(v)));
                    }
                    if child.is_empty() {
                        out.push_str("/>");
                        continue;
                    }
                    out.push('>');
                    child.render(out);
                }
            }
            out.push_str("</");
            out.push_str(&element.name);
            out.push('>');
        }
    }
}

/// Render a full request envelope for `operation` on `service`.
pub fn build_envelope(
    service: Service,
    operation: &str,
    message: Option<&Message>,
    security: Option<&UsernameToken>,
) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push_str(&format!(
        r#"<s:Envelope xmlns:s="{}" xmlns:tt="{}" xmlns:tds="{}" xmlns:trt="{}" xmlns:tptz="{}">"#,
        NS_SOAP_ENV, NS_ONVIF_SCHEMA, NS_ONVIF_DEVICE, NS_ONVIF_MEDIA, NS_ONVIF_PTZ
    ));
    out.push_str("<s:Header>");
    if let Some(token) = security {
        out.push_str(&token.to_xml());
    }
    out.push_str("</s:Header><s:Body>");

    let op = format!("{}:{}", service.prefix(), operation);
    match message.filter(|m| !m.is_empty()) {
        Some(m) => {
            out.push_str(&format!("<{}>", op));
            out.push_str(&m.to_xml());
            out.push_str(&format!("</{}>", op));
        }
        None => out.push_str(&format!("<{}/>", op)),
    }

    out.push_str("</s:Body></s:Envelope>");
    out
}
