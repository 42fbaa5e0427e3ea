//! XSD element declarations

use crate::namespaces::QName;

use super::schemas::TypeRef;

/// An `xs:element` declaration, global or local
///
/// Occurrence bounds belong to the particle that uses the declaration, not
/// to the declaration itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    /// Qualified element name (namespace set according to the element form)
    pub name: QName,
    /// Declared type; `None` means `xs:anyType`
    pub type_ref: Option<TypeRef>,
    /// Whether `xsi:nil` is allowed
    pub nillable: bool,
    /// Default value for empty elements
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// Abstract elements cannot appear in instances
    pub is_abstract: bool,
}

impl ElementDecl {
    /// Create a declaration with no type
    pub fn new(name: QName) -> Self {
        Self {
            name,
            type_ref: None,
            nillable: false,
            default: None,
            fixed: None,
            is_abstract: false,
        }
    }

    /// Set the declared type
    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = Some(type_ref);
        self
    }

    /// Value used for an empty element: the fixed value, else the default
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed.as_deref().or(self.default.as_deref())
    }
}
