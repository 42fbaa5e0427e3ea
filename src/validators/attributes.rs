//! XSD attribute declarations, attribute uses and attribute groups

use crate::error::ParseError;
use crate::namespaces::QName;

use super::schemas::TypeRef;
use super::wildcards::Wildcard;

/// The `use` attribute of a local attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUseKind {
    /// May be omitted
    #[default]
    Optional,
    /// Must be present
    Required,
    /// Must not be present
    Prohibited,
}

impl AttributeUseKind {
    /// Parse from the `use` attribute value
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s.trim() {
            "optional" => Ok(Self::Optional),
            "required" => Ok(Self::Required),
            "prohibited" => Ok(Self::Prohibited),
            other => Err(ParseError::new(format!(
                "wrong value '{}' for 'use' attribute",
                other
            ))),
        }
    }
}

/// An attribute as used by a complex type or an attribute group
///
/// Global declarations are stored with the same shape and
/// [`AttributeUseKind::Optional`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUse {
    /// Qualified attribute name
    pub name: QName,
    /// Declared type; `None` means `xs:anySimpleType` (or the referenced
    /// global declaration's type when `is_ref` is set)
    pub type_ref: Option<TypeRef>,
    /// Declared with `ref=` to a global attribute
    pub is_ref: bool,
    /// Presence constraint
    pub use_kind: AttributeUseKind,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
}

impl AttributeUse {
    /// Create an optional attribute with no type
    pub fn new(name: QName) -> Self {
        Self {
            name,
            type_ref: None,
            is_ref: false,
            use_kind: AttributeUseKind::Optional,
            default: None,
            fixed: None,
        }
    }

    /// Whether the attribute must be present
    pub fn is_required(&self) -> bool {
        self.use_kind == AttributeUseKind::Required
    }

    /// Whether the attribute must be absent
    pub fn is_prohibited(&self) -> bool {
        self.use_kind == AttributeUseKind::Prohibited
    }
}

/// A named `xs:attributeGroup`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeGroup {
    /// Group name
    pub name: Option<QName>,
    /// Attributes declared directly in the group
    pub attributes: Vec<AttributeUse>,
    /// Nested attribute group references
    pub group_refs: Vec<QName>,
    /// Attribute wildcard
    pub any_attribute: Option<Wildcard>,
}

/// Add `attribute` to `uses`, replacing a use with the same name
pub fn merge_attribute(uses: &mut Vec<AttributeUse>, attribute: AttributeUse) {
    match uses.iter_mut().find(|u| u.name == attribute.name) {
        Some(existing) => *existing = attribute,
        None => uses.push(attribute),
    }
}
