//! XSD complex type definitions

use crate::namespaces::QName;

use super::attributes::AttributeUse;
use super::groups::ModelGroup;
use super::schemas::TypeRef;
use super::wildcards::Wildcard;

/// Derivation method of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// `xs:extension`
    Extension,
    /// `xs:restriction`
    Restriction,
}

/// Base type and method of a derived complex type
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// Base type name
    pub base: QName,
    /// How the type derives from its base
    pub method: DerivationMethod,
}

/// Content type of a complex type
#[derive(Debug, Clone, PartialEq)]
pub enum ContentType {
    /// No character data and no children
    Empty,
    /// Character data of a simple type
    Simple(TypeRef),
    /// Child elements described by a model group
    Elements(ModelGroup),
}

/// An `xs:complexType` definition
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    /// Type name, `None` for anonymous types
    pub name: Option<QName>,
    /// Content type
    pub content: ContentType,
    /// Whether character data may be interleaved with children
    pub mixed: bool,
    /// Attribute uses
    pub attributes: Vec<AttributeUse>,
    /// Referenced attribute groups, expanded when the schema is finalized
    pub attribute_group_refs: Vec<QName>,
    /// Attribute wildcard
    pub any_attribute: Option<Wildcard>,
    /// Base type, merged into this type when the schema is finalized
    pub derivation: Option<Derivation>,
    /// Abstract types cannot be used directly by instances
    pub is_abstract: bool,
}

impl ComplexType {
    /// Create an anonymous type with empty content
    pub fn new(name: Option<QName>) -> Self {
        Self {
            name,
            content: ContentType::Empty,
            mixed: false,
            attributes: Vec::new(),
            attribute_group_refs: Vec::new(),
            any_attribute: None,
            derivation: None,
            is_abstract: false,
        }
    }

    /// The `xs:anyType` definition: any attributes, any children, mixed
    pub fn any_type() -> Self {
        let mut group = ModelGroup::new(super::groups::Compositor::Sequence);
        group.particles.push(super::groups::Particle::Any(Wildcard::lax_any()));
        Self {
            name: Some(QName::xsd(super::builtins::XSD_ANY_TYPE)),
            content: ContentType::Elements(group),
            mixed: true,
            any_attribute: Some(Wildcard::lax_any()),
            ..Self::new(None)
        }
    }

    /// Whether the type has simple content
    pub fn has_simple_content(&self) -> bool {
        matches!(self.content, ContentType::Simple(_))
    }

    /// Model group of element content
    pub fn model_group(&self) -> Option<&ModelGroup> {
        match &self.content {
            ContentType::Elements(group) => Some(group),
            _ => None,
        }
    }

    /// Whether the type accepts no children and no text
    pub fn is_empty(&self) -> bool {
        match &self.content {
            ContentType::Empty => !self.mixed,
            ContentType::Elements(group) => group.is_empty() && !self.mixed,
            ContentType::Simple(_) => false,
        }
    }

    /// Look up an attribute use by name
    pub fn attribute(&self, name: &QName) -> Option<&AttributeUse> {
        self.attributes.iter().find(|a| &a.name == name)
    }
}
