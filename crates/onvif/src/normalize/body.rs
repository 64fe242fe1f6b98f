// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical response tree produced by the normalizer.

/// Key prefix reserved for XML attributes (`@token`).
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key holding character data of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// One node of a normalized response.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character data of a leaf element (possibly empty).
    Text(String),
    /// Element with attributes and/or child elements.
    Map(Body),
    /// Repeatable element, in document order.
    List(Vec<Value>),
}

impl Value {
    /// Text of a leaf, or the `#text` of an element carrying attributes.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            Value::Map(body) => body.text(TEXT_KEY),
            Value::List(_) => None,
        }
    }

    /// Mapping view of this value.
    pub fn as_map(&self) -> Option<&Body> {
        match self {
            Value::Map(body) => Some(body),
            _ => None,
        }
    }

    /// Sequence view of this value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// `true`/`1` and `false`/`0` per `xs:boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_text()?.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    /// Parse the text as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_text()?.trim().parse().ok()
    }

    /// Parse the text as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_text()?.trim().parse().ok()
    }
}

/// Ordered mapping from snake_case key to [`Value`].
///
/// Keys keep document order. Attribute keys start with [`ATTRIBUTE_PREFIX`]
/// so they never collide with child element names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    entries: Vec<(String, Value)>,
}

impl Body {
    /// Create an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Mutable lookup, used while building.
    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attribute value (`name` without the `@`).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.strip_prefix(ATTRIBUTE_PREFIX) == Some(name))
            .and_then(|(_, v)| v.as_text())
    }

    /// Text of a child element.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// Text of a child element, owned and trimmed.
    pub fn string(&self, key: &str) -> Option<String> {
        self.text(key).map(|s| s.trim().to_string())
    }

    /// Child mapping. A sequence yields its first mapping.
    pub fn map(&self, key: &str) -> Option<&Body> {
        match self.get(key)? {
            Value::Map(body) => Some(body),
            Value::List(items) => items.iter().find_map(Value::as_map),
            Value::Text(_) => None,
        }
    }

    /// Child mappings as a sequence: absent -> empty, single -> one element.
    pub fn maps(&self, key: &str) -> Vec<&Body> {
        match self.get(key) {
            None | Some(Value::Text(_)) => Vec::new(),
            Some(Value::Map(body)) => vec![body],
            Some(Value::List(items)) => items.iter().filter_map(Value::as_map).collect(),
        }
    }

    /// Child texts as a sequence: absent -> empty, single -> one element.
    pub fn texts(&self, key: &str) -> Vec<&str> {
        match self.get(key) {
            None => Vec::new(),
            Some(Value::List(items)) => items.iter().filter_map(Value::as_text).collect(),
            Some(v) => v.as_text().into_iter().collect(),
        }
    }

    /// Walk nested mappings.
    pub fn path(&self, keys: &[&str]) -> Option<&Value> {
        let (last, parents) = keys.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.map(key)?;
        }
        current.get(last)
    }

    /// Text at a nested path.
    pub fn path_text(&self, keys: &[&str]) -> Option<&str> {
        self.path(keys).and_then(Value::as_text)
    }

    /// Boolean child.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Floating point child.
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Integer child.
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Map(body) => body.serialize(serializer),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Body {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
