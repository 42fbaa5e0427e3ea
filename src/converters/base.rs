//! Base converter types
//!
//! This module provides the foundational types for XML to JSON conversion.

use serde_json::{Map, Value as JsonValue};

use super::{AttributeList, XmlnsDecl};

/// A decoded child element
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Key of the child, its lexical name
    pub name: String,
    /// Decoded value
    pub value: JsonValue,
    /// Whether the content model allows the child to repeat
    pub repeats: bool,
}

/// Element data for conversion to JSON
///
/// Represents the data decoded from an XML element.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// The element tag name
    pub tag: String,
    /// The decoded text content
    pub text: Option<JsonValue>,
    /// Decoded child elements, in document order
    pub content: Vec<ContentItem>,
    /// Decoded attributes
    pub attributes: AttributeList,
    /// Xmlns declarations
    pub xmlns: XmlnsDecl,
}

impl ElementData {
    /// Create new element data with a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<JsonValue>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Add a child element
    pub fn with_child(mut self, name: impl Into<String>, value: JsonValue, repeats: bool) -> Self {
        self.content.push(ContentItem {
            name: name.into(),
            value,
            repeats,
        });
        self
    }

    /// Add xmlns declaration
    pub fn with_xmlns(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.xmlns.push((prefix.into(), uri.into()));
        self
    }
}

/// Default XML Schema converter
///
/// Converts decoded elements to JSON objects that keep document order:
/// - namespace declarations first, as `@xmlns` / `@xmlns:prefix`
/// - attributes prefixed with '@'
/// - text content under the '$' key
/// - child elements as properties, arrays for repeatable children
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSchemaConverter;

impl XmlSchemaConverter {
    /// Key of text content in elements that also have attributes or children
    pub const TEXT_KEY: &'static str = "$";
    /// Prefix of attribute keys
    pub const ATTR_PREFIX: &'static str = "@";

    /// Create a new XmlSchemaConverter
    pub fn new() -> Self {
        Self
    }

    /// Decode element data to a JSON value
    pub fn decode(&self, data: ElementData) -> JsonValue {
        let ElementData {
            text,
            content,
            attributes,
            xmlns,
            ..
        } = data;

        if xmlns.is_empty() && attributes.is_empty() && content.is_empty() {
            return text.unwrap_or(JsonValue::Null);
        }

        let mut result = Map::new();
        for (prefix, uri) in xmlns {
            let key = if prefix.is_empty() {
                format!("{}xmlns", Self::ATTR_PREFIX)
            } else {
                format!("{}xmlns:{}", Self::ATTR_PREFIX, prefix)
            };
            result.insert(key, JsonValue::String(uri));
        }

        for (name, value) in attributes {
            result.insert(format!("{}{}", Self::ATTR_PREFIX, name), value);
        }

        if let Some(text) = text {
            result.insert(Self::TEXT_KEY.to_string(), text);
        }

        for item in content {
            match result.get_mut(&item.name) {
                Some(JsonValue::Array(values)) => values.push(item.value),
                Some(existing) => {
                    // A name the model does not let repeat occurred twice
                    let first = existing.take();
                    *existing = JsonValue::Array(vec![first, item.value]);
                }
                None if item.repeats => {
                    result.insert(item.name, JsonValue::Array(vec![item.value]));
                }
                None => {
                    result.insert(item.name, item.value);
                }
            }
        }

        JsonValue::Object(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_simple_text() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("price").with_text(json!(9.5));
        assert_eq!(converter.decode(data), json!(9.5));
        assert_eq!(converter.decode(ElementData::new("empty")), JsonValue::Null);
    }

    #[test]
    fn test_attributes_and_text() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("title")
            .with_attribute("lang", "en")
            .with_text("Dune");

        let value = converter.decode(data);
        assert_eq!(value, json!({"@lang": "en", "$": "Dune"}));
    }

    #[test]
    fn test_key_order_follows_document() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("root")
            .with_xmlns("", "urn:books")
            .with_xmlns("x", "urn:extra")
            .with_attribute("version", 2)
            .with_child("zeta", json!(1), false)
            .with_child("alpha", json!(2), false);

        let value = converter.decode(data);
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@xmlns", "@xmlns:x", "@version", "zeta", "alpha"]);
    }

    #[test]
    fn test_repeatable_children_are_arrays() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("book")
            .with_child("author", json!("Frank"), true)
            .with_child("title", json!("Dune"), false);

        assert_eq!(
            converter.decode(data),
            json!({"author": ["Frank"], "title": "Dune"})
        );
    }

    #[test]
    fn test_unexpected_repeat_is_promoted() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("book")
            .with_child("title", json!("A"), false)
            .with_child("title", json!("B"), false);

        assert_eq!(converter.decode(data), json!({"title": ["A", "B"]}));
    }

    #[test]
    fn test_mixed_text_under_text_key() {
        let converter = XmlSchemaConverter::new();
        let data = ElementData::new("p")
            .with_text("Hello world")
            .with_child("b", json!("world"), true);

        assert_eq!(
            converter.decode(data),
            json!({"$": "Hello world", "b": ["world"]})
        );
    }
}
