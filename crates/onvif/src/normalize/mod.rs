// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML response normalizer.
//!
//! Turns a SOAP response element into a [`Body`] with predictable shape:
//!
//! - element names lose their namespace prefix and become snake_case,
//!   whatever casing the vendor used (`DNSFromDHCP` -> `dns_from_dhcp`);
//! - elements the ONVIF schema allows to repeat are **always** a
//!   [`Value::List`], even with a single instance;
//! - siblings sharing a name are a list in document order;
//! - attributes live next to child elements under the `@` prefix.

mod body;

pub use body::{Body, Value, ATTRIBUTE_PREFIX, TEXT_KEY};

use roxmltree::Node;
use std::collections::HashSet;

/// Repeatable ONVIF elements. `parent/child` entries only apply under that parent.
const ONVIF_REPEATABLE: &[&str] = &[
    // Device management
    "service",
    "network_interfaces",
    "network_protocols",
    "network_protocols/port",
    "scopes",
    "dns_information/search_domain",
    "dns_information/dns_from_dhcp",
    "dns_information/dns_manual",
    "ntp_information/ntp_from_dhcp",
    "ntp_information/ntp_manual",
    "config/manual",
    // Media
    "profiles",
    "video_sources",
    "audio_sources",
    "configurations",
    // PTZ
    "preset",
    "ptz_configuration",
    "ptz_node",
];

/// Structural normalizer for parsed SOAP bodies.
#[derive(Debug, Clone)]
pub struct Normalizer {
    repeatable: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer knowing the ONVIF repeatable elements.
    pub fn new() -> Self {
        Self {
            repeatable: ONVIF_REPEATABLE.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Normalizer with no schema knowledge; only duplicated siblings become lists.
    pub fn schemaless() -> Self {
        Self {
            repeatable: HashSet::new(),
        }
    }

    /// Declare an additional repeatable element (`child` or `parent/child`, snake_case).
    pub fn with_repeatable(mut self, key: impl Into<String>) -> Self {
        self.repeatable.insert(key.into());
        self
    }

    fn is_repeatable(&self, parent: &str, child: &str) -> bool {
        self.repeatable.contains(child)
            || self
                .repeatable
                .iter()
                .any(|rule| rule.split_once('/') == Some((parent, child)))
    }

    /// Normalize one element into a mapping.
    ///
    /// A leaf element without attributes yields a body holding only `#text`.
    pub fn normalize(&self, element: Node<'_, '_>) -> Body {
        match self.element_value(element) {
            Value::Map(body) => body,
            Value::Text(text) => {
                let mut body = Body::new();
                if !text.is_empty() {
                    body.insert(TEXT_KEY, Value::Text(text));
                }
                body
            }
            // element_value never yields a list for a single element
            Value::List(_) => Body::new(),
        }
    }

    fn element_value(&self, element: Node<'_, '_>) -> Value {
        let parent_key = snake_case(element.tag_name().name());
        let children: Vec<Node<'_, '_>> = element.children().filter(Node::is_element).collect();
        let mut body = Body::new();

        for attr in element.attributes() {
            body.insert(
                format!("{}{}", ATTRIBUTE_PREFIX, snake_case(attr.name())),
                Value::Text(attr.value().to_string()),
            );
        }

        if children.is_empty() {
            let text = collect_text(element);
            if body.is_empty() {
                return Value::Text(text);
            }
            if !text.is_empty() {
                body.insert(TEXT_KEY, Value::Text(text));
            }
            return Value::Map(body);
        }

        let keys: Vec<String> = children
            .iter()
            .map(|c| snake_case(c.tag_name().name()))
            .collect();

        for (child, key) in children.iter().zip(&keys) {
            let value = self.element_value(*child);
            let repeated = keys.iter().filter(|k| *k == key).count() > 1;

            if repeated || self.is_repeatable(&parent_key, key) {
                match body.get_mut(key) {
                    Some(Value::List(items)) => items.push(value),
                    _ => body.insert(key.clone(), Value::List(vec![value])),
                }
            } else {
                body.insert(key.clone(), value);
            }
        }

        let mixed = collect_text(element);
        if !mixed.is_empty() {
            body.insert(TEXT_KEY, Value::Text(mixed));
        }

        Value::Map(body)
    }
}

/// Direct character data of an element, trimmed.
fn collect_text(element: Node<'_, '_>) -> String {
    element
        .children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert a wire name to snake_case.
///
/// An underscore goes before an uppercase letter that follows a lowercase
/// letter or digit, or that starts a new word after an acronym
/// (`PTZConfiguration` -> `ptz_configuration`). `IPv4`/`IPv6` are treated as
/// single words.
///
/// Word boundaries come from case changes only, so spellings with no case
/// change do not converge: `HwAddress`, `hwAddress` and `HWAddress` all give
/// `hw_address`, but `hwaddress` and `HWADDRESS` give `hwaddress`. ONVIF
/// schema names are camel case, so this only affects non-conforming vendors,
/// whose keys must be looked up by the flattened spelling.
pub fn snake_case(name: &str) -> String {
    let name = name.replace("IPv4", "Ipv4").replace("IPv6", "Ipv6");
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '.' {
            out.push('_');
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 && !out.ends_with('_') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Convert a snake_case name to the UpperCamelCase used by ONVIF element names.
pub fn upper_camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    fn normalize_xml(xml: &str) -> Body {
        let doc = Document::parse(xml).unwrap();
        Normalizer::new().normalize(doc.root_element())
    }

    #[test]
    fn test_snake_case_conventions() {
        assert_eq!(snake_case("HwAddress"), "hw_address");
        assert_eq!(snake_case("DNSFromDHCP"), "dns_from_dhcp");
        assert_eq!(snake_case("PTZConfiguration"), "ptz_configuration");
        assert_eq!(snake_case("IPv4"), "ipv4");
        assert_eq!(snake_case("IPv4Address"), "ipv4_address");
        assert_eq!(snake_case("XAddr"), "x_addr");
        assert_eq!(snake_case("token"), "token");
        assert_eq!(snake_case("Manufacturer"), "manufacturer");
    }

    #[test]
    fn test_snake_case_needs_a_case_change_to_split() {
        for camel in ["HwAddress", "hwAddress", "HWAddress"] {
            assert_eq!(snake_case(camel), "hw_address", "{}", camel);
        }
        for flat in ["hwaddress", "HWADDRESS"] {
            assert_eq!(snake_case(flat), "hwaddress", "{}", flat);
        }
    }

    #[test]
    fn test_upper_camel_case() {
        assert_eq!(upper_camel_case("profile_token"), "ProfileToken");
        assert_eq!(upper_camel_case("include_capability"), "IncludeCapability");
        assert_eq!(upper_camel_case("name"), "Name");
    }

    #[test]
    fn test_single_repeatable_is_list() {
        let body = normalize_xml(
            r#"<trt:GetProfilesResponse xmlns:trt="http://www.onvif.org/ver10/media/wsdl"
                   xmlns:tt="http://www.onvif.org/ver10/schema">
                 <trt:Profiles token="p0" fixed="true"><tt:Name>Main</tt:Name></trt:Profiles>
               </trt:GetProfilesResponse>"#,
        );
        let list = body.get("profiles").and_then(Value::as_list).unwrap();
        assert_eq!(list.len(), 1);
        let profile = list[0].as_map().unwrap();
        assert_eq!(profile.attr("token"), Some("p0"));
        assert_eq!(profile.text("name"), Some("Main"));
    }

    #[test]
    fn test_multiple_instances_keep_document_order() {
        let body = normalize_xml(
            r#"<GetServicesResponse>
                 <Service><Namespace>a</Namespace></Service>
                 <Service><Namespace>b</Namespace></Service>
                 <Service><Namespace>c</Namespace></Service>
               </GetServicesResponse>"#,
        );
        let ns: Vec<&str> = body
            .maps("service")
            .iter()
            .filter_map(|s| s.text("namespace"))
            .collect();
        assert_eq!(ns, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_siblings_become_list_without_schema() {
        let doc = Document::parse("<r><Item>1</Item><Item>2</Item><Other>x</Other></r>").unwrap();
        let body = Normalizer::schemaless().normalize(doc.root_element());
        assert_eq!(body.texts("item"), vec!["1", "2"]);
        assert_eq!(body.text("other"), Some("x"));
    }

    #[test]
    fn test_attribute_does_not_collide_with_element() {
        let body = normalize_xml(r#"<Cfg token="attr"><Token>elem</Token></Cfg>"#);
        assert_eq!(body.attr("token"), Some("attr"));
        assert_eq!(body.text("token"), Some("elem"));
    }

    #[test]
    fn test_leaf_with_attributes_keeps_text() {
        let body = normalize_xml(r#"<R><Value unit="ms">250</Value></R>"#);
        let value = body.map("value").unwrap();
        assert_eq!(value.attr("unit"), Some("ms"));
        assert_eq!(body.get("value").and_then(Value::as_i64), Some(250));
    }

    #[test]
    fn test_parent_scoped_rule() {
        let body = normalize_xml(
            r#"<GetDNSResponse><DNSInformation>
                 <FromDHCP>false</FromDHCP>
                 <SearchDomain>lan</SearchDomain>
                 <DNSManual><Type>IPv4</Type><IPv4Address>1.1.1.1</IPv4Address></DNSManual>
               </DNSInformation></GetDNSResponse>"#,
        );
        let info = body.map("dns_information").unwrap();
        assert_eq!(info.texts("search_domain"), vec!["lan"]);
        assert_eq!(info.maps("dns_manual").len(), 1);
        assert_eq!(info.maps("dns_from_dhcp").len(), 0);
        assert!(matches!(info.get("from_dhcp"), Some(Value::Text(_))));
        assert_eq!(
            info.maps("dns_manual")[0].text("ipv4_address"),
            Some("1.1.1.1")
        );
    }

    #[test]
    fn test_wire_casing_does_not_matter() {
        let a = normalize_xml("<R><HwAddress>aa</HwAddress></R>");
        let b = normalize_xml("<R><hwAddress>aa</hwAddress></R>");
        assert_eq!(a.text("hw_address"), b.text("hw_address"));
    }
}
