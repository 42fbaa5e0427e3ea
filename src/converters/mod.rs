//! XML to data converters
//!
//! Decoded elements are collected into [`ElementData`] and turned into JSON
//! values by the [`XmlSchemaConverter`]. Its convention:
//! - attributes are keys prefixed with `@`
//! - text of elements that also carry attributes or children goes under `$`
//! - child elements become object properties, arrays when they may repeat
//! - namespace declarations are kept as `@xmlns` / `@xmlns:prefix` keys

mod base;

pub use base::{ContentItem, ElementData, XmlSchemaConverter};

use serde_json::Value as JsonValue;

/// Type alias for xmlns declarations (prefix, uri), the empty prefix being the default namespace
pub type XmlnsDecl = Vec<(String, String)>;

/// Type alias for decoded attributes, in document order
pub type AttributeList = Vec<(String, JsonValue)>;
