//! XML Schema
//!
//! [`XsdSchema`] holds every component of a schema set (the main document
//! plus its includes and imports) and is the entry point for validating and
//! decoding instance documents.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::attributes::{merge_attribute, AttributeGroup, AttributeUse};
use super::builtins::{XSD_ANY_TYPE, XSD_ID};
use super::complex_types::{ComplexType, ContentType, DerivationMethod};
use super::document_validation;
use super::elements::ElementDecl;
use super::groups::{Compositor, ModelGroup, Particle};
use super::parsing::SchemaParser;
use super::simple_types::{self, SimpleType, SimpleVariety};
use super::validation::ValidationMode;
use super::wildcards::Wildcard;

use crate::documents::Document;
use crate::error::{Error, ParseError, Result, ValidationError};
use crate::loaders::Loader;
use crate::namespaces::{QName, XML_NAMESPACE};

/// Index of a type definition in the schema's arenas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeId {
    /// Simple type arena index
    Simple(usize),
    /// Complex type arena index
    Complex(usize),
}

/// Reference to a type: by name, or directly for anonymous types
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Named type, resolved when used
    Named(QName),
    /// Anonymous (inline) type
    Id(TypeId),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "type '{}'", name),
            TypeRef::Id(_) => write!(f, "anonymous type"),
        }
    }
}

/// A compiled XML Schema
#[derive(Debug)]
pub struct XsdSchema {
    /// Target namespace of the main schema document
    pub target_namespace: Option<String>,
    /// Mode the schema was built with
    pub mode: ValidationMode,
    simple_types: Vec<SimpleType>,
    complex_types: Vec<ComplexType>,
    types: IndexMap<QName, TypeId>,
    elements: IndexMap<QName, ElementDecl>,
    attributes: IndexMap<QName, AttributeUse>,
    groups: IndexMap<QName, ModelGroup>,
    attribute_groups: IndexMap<QName, AttributeGroup>,
    build_errors: Vec<ParseError>,
    loader: Loader,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MergeState {
    Pending,
    InProgress,
    Done,
}

impl XsdSchema {
    /// Create an empty schema holding only the built-in components
    pub fn new(mode: ValidationMode) -> Self {
        let mut schema = Self {
            target_namespace: None,
            mode,
            simple_types: Vec::new(),
            complex_types: Vec::new(),
            types: IndexMap::new(),
            elements: IndexMap::new(),
            attributes: IndexMap::new(),
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            build_errors: Vec::new(),
            loader: Loader::new(),
        };
        schema.register_builtins();
        schema
    }

    fn register_builtins(&mut self) {
        for builtin in simple_types::builtin_types() {
            let name = builtin.name.clone();
            let id = self.add_simple_type(builtin);
            if let Some(name) = name {
                self.types.insert(name, id);
            }
        }
        let any_type = self.add_complex_type(ComplexType::any_type());
        self.types.insert(QName::xsd(XSD_ANY_TYPE), any_type);

        // Attributes of the XML namespace, usable without importing it
        for (local, type_name) in [("lang", "string"), ("space", "NCName"), ("base", "anyURI"), ("id", XSD_ID)] {
            let mut attribute = AttributeUse::new(QName::namespaced(XML_NAMESPACE, local));
            attribute.type_ref = Some(TypeRef::Named(QName::xsd(type_name)));
            self.attributes.insert(attribute.name.clone(), attribute);
        }
    }

    /// Load and build a schema from a file (strict build)
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_mode(path, ValidationMode::Strict)
    }

    /// Load and build a schema from a file
    ///
    /// In lax mode, defects that can be degraded become [`build_errors`](Self::build_errors)
    /// instead of failures.
    pub fn from_file_with_mode(path: &Path, mode: ValidationMode) -> Result<Self> {
        let mut schema = Self::new(mode);
        SchemaParser::new(&mut schema, mode).parse_file(path)?;
        schema.build()?;
        Ok(schema)
    }

    /// Build a schema from a string (strict build)
    pub fn from_string(xsd: &str) -> Result<Self> {
        Self::from_string_with_mode(xsd, ValidationMode::Strict)
    }

    /// Build a schema from a string
    pub fn from_string_with_mode(xsd: &str, mode: ValidationMode) -> Result<Self> {
        let mut schema = Self::new(mode);
        SchemaParser::new(&mut schema, mode).parse_string(xsd)?;
        schema.build()?;
        Ok(schema)
    }

    fn build(&mut self) -> Result<()> {
        self.finalize()?;
        let unresolved = self.check_references();
        if self.mode == ValidationMode::Strict {
            if let Some(error) = unresolved.into_iter().next() {
                return Err(error.into());
            }
        } else {
            self.build_errors.extend(unresolved);
        }
        log::debug!(
            "schema built: {} elements, {} types, {} build errors",
            self.elements.len(),
            self.types.len(),
            self.build_errors.len()
        );
        Ok(())
    }

    /// Defects tolerated by a lax build
    pub fn build_errors(&self) -> &[ParseError] {
        &self.build_errors
    }

    /// Record a tolerated defect, or fail in strict mode
    pub(crate) fn recover(&mut self, error: ParseError) -> Result<()> {
        match self.mode {
            ValidationMode::Strict => Err(error.into()),
            _ => {
                log::debug!("schema defect tolerated: {}", error);
                self.build_errors.push(error);
                Ok(())
            }
        }
    }

    /// Loader used for the schema set and instance documents
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Replace the loader, before any schema document is parsed
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    // Component registration, used by the parser

    pub(crate) fn add_simple_type(&mut self, simple_type: SimpleType) -> TypeId {
        self.simple_types.push(simple_type);
        TypeId::Simple(self.simple_types.len() - 1)
    }

    pub(crate) fn add_complex_type(&mut self, complex_type: ComplexType) -> TypeId {
        self.complex_types.push(complex_type);
        TypeId::Complex(self.complex_types.len() - 1)
    }

    pub(crate) fn register_type(&mut self, name: QName, id: TypeId) -> Result<()> {
        if self.types.contains_key(&name) {
            return self.recover(ParseError::new(format!("duplicate type definition '{}'", name)));
        }
        self.types.insert(name, id);
        Ok(())
    }

    pub(crate) fn register_element(&mut self, decl: ElementDecl) -> Result<()> {
        if self.elements.contains_key(&decl.name) {
            return self.recover(ParseError::new(format!(
                "duplicate element declaration '{}'",
                decl.name
            )));
        }
        self.elements.insert(decl.name.clone(), decl);
        Ok(())
    }

    pub(crate) fn register_attribute(&mut self, attribute: AttributeUse) -> Result<()> {
        if self.attributes.contains_key(&attribute.name)
            && !attribute.name.is_in(Some(XML_NAMESPACE))
        {
            return self.recover(ParseError::new(format!(
                "duplicate attribute declaration '{}'",
                attribute.name
            )));
        }
        self.attributes.insert(attribute.name.clone(), attribute);
        Ok(())
    }

    pub(crate) fn register_group(&mut self, name: QName, group: ModelGroup) -> Result<()> {
        if self.groups.contains_key(&name) {
            return self.recover(ParseError::new(format!("duplicate group '{}'", name)));
        }
        self.groups.insert(name, group);
        Ok(())
    }

    pub(crate) fn register_attribute_group(&mut self, name: QName, group: AttributeGroup) -> Result<()> {
        if self.attribute_groups.contains_key(&name) {
            return self.recover(ParseError::new(format!("duplicate attribute group '{}'", name)));
        }
        self.attribute_groups.insert(name, group);
        Ok(())
    }

    // Lookups

    /// Resolve a type reference
    pub fn type_id(&self, type_ref: &TypeRef) -> Option<TypeId> {
        match type_ref {
            TypeRef::Named(name) => self.types.get(name).copied(),
            TypeRef::Id(id) => Some(*id),
        }
    }

    /// Simple type by arena index
    pub fn simple_type(&self, id: usize) -> &SimpleType {
        &self.simple_types[id]
    }

    /// Complex type by arena index
    pub fn complex_type(&self, id: usize) -> &ComplexType {
        &self.complex_types[id]
    }

    /// The `xs:anyType` definition
    pub fn any_type(&self) -> TypeId {
        self.types
            .get(&QName::xsd(XSD_ANY_TYPE))
            .copied()
            .unwrap_or(TypeId::Complex(0))
    }

    /// Global element declaration
    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// Global attribute declaration
    pub fn attribute(&self, name: &QName) -> Option<&AttributeUse> {
        self.attributes.get(name)
    }

    /// Named model group
    pub fn group(&self, name: &QName) -> Option<&ModelGroup> {
        self.groups.get(name)
    }

    /// Named attribute group
    pub fn attribute_group(&self, name: &QName) -> Option<&AttributeGroup> {
        self.attribute_groups.get(name)
    }

    /// Global element declarations in document order
    pub fn elements(&self) -> impl Iterator<Item = &ElementDecl> {
        self.elements.values()
    }

    /// Model group of a global element's complex type
    pub fn element_model(&self, name: &QName) -> Option<&ModelGroup> {
        let decl = self.element(name)?;
        match self.type_id(decl.type_ref.as_ref()?)? {
            TypeId::Complex(id) => self.complex_type(id).model_group(),
            TypeId::Simple(_) => None,
        }
    }

    // Validation and decoding

    /// Validate a document; the first error is returned
    pub fn validate(&self, doc: &Document) -> Result<()> {
        document_validation::decode_document(self, doc, ValidationMode::Strict).map(|_| ())
    }

    /// Read and validate a document file
    pub fn validate_file(&self, path: &Path) -> Result<()> {
        let doc = Document::from_file(path, &self.loader)?;
        self.validate(&doc)
    }

    /// Whether a document is valid
    pub fn is_valid(&self, doc: &Document) -> bool {
        self.validate(doc).is_ok()
    }

    /// All validation errors of a document
    pub fn iter_errors(&self, doc: &Document) -> Vec<ValidationError> {
        match document_validation::decode_document(self, doc, ValidationMode::Lax) {
            Ok((_, errors)) => errors,
            Err(Error::Validation(error)) => vec![error],
            Err(other) => vec![ValidationError::new(other.to_string())],
        }
    }

    /// Read a document file and collect all its validation errors
    pub fn iter_errors_file(&self, path: &Path) -> Result<Vec<ValidationError>> {
        let doc = Document::from_file(path, &self.loader)?;
        Ok(self.iter_errors(&doc))
    }

    /// Decode a document into an ordered JSON mapping
    ///
    /// In strict mode the first validation error is returned as `Err`; in lax
    /// and skip modes the value is produced best-effort together with the
    /// errors found on the way.
    pub fn decode(
        &self,
        doc: &Document,
        mode: ValidationMode,
    ) -> Result<(JsonValue, Vec<ValidationError>)> {
        document_validation::decode_document(self, doc, mode)
    }

    /// Read and decode a document file
    pub fn decode_file(
        &self,
        path: &Path,
        mode: ValidationMode,
    ) -> Result<(JsonValue, Vec<ValidationError>)> {
        let doc = Document::from_file(path, &self.loader)?;
        self.decode(&doc, mode)
    }

    // Finalization

    /// Expand attribute groups and merge derived complex types with their bases
    fn finalize(&mut self) -> Result<()> {
        for id in 0..self.complex_types.len() {
            let refs = std::mem::take(&mut self.complex_types[id].attribute_group_refs);
            let mut attributes = Vec::new();
            let mut wildcard = None;
            for name in &refs {
                if let Err(error) = self.collect_attribute_group(name, &mut attributes, &mut wildcard, 0) {
                    self.recover(error)?;
                }
            }
            let complex = &mut self.complex_types[id];
            for attribute in attributes {
                if complex.attribute(&attribute.name).is_none() {
                    complex.attributes.push(attribute);
                }
            }
            if complex.any_attribute.is_none() {
                complex.any_attribute = wildcard;
            }
        }

        let mut states = vec![MergeState::Pending; self.complex_types.len()];
        for id in 0..self.complex_types.len() {
            self.merge_base(id, &mut states)?;
        }
        Ok(())
    }

    fn collect_attribute_group(
        &self,
        name: &QName,
        attributes: &mut Vec<AttributeUse>,
        wildcard: &mut Option<Wildcard>,
        depth: usize,
    ) -> std::result::Result<(), ParseError> {
        if depth > 64 {
            return Err(ParseError::new(format!("circular attribute group '{}'", name)));
        }
        let group = self
            .attribute_groups
            .get(name)
            .ok_or_else(|| ParseError::new(format!("unknown attribute group '{}'", name)))?;
        for attribute in &group.attributes {
            merge_attribute(attributes, attribute.clone());
        }
        if wildcard.is_none() {
            *wildcard = group.any_attribute.clone();
        }
        for nested in &group.group_refs {
            self.collect_attribute_group(nested, attributes, wildcard, depth + 1)?;
        }
        Ok(())
    }

    fn merge_base(&mut self, id: usize, states: &mut Vec<MergeState>) -> Result<()> {
        match states[id] {
            MergeState::Done => return Ok(()),
            MergeState::InProgress => {
                states[id] = MergeState::Done;
                let name = self.complex_types[id]
                    .name
                    .as_ref()
                    .map_or_else(|| "anonymous".to_string(), |n| n.to_string());
                return self.recover(ParseError::new(format!(
                    "circular derivation of complex type '{}'",
                    name
                )));
            }
            MergeState::Pending => {}
        }
        states[id] = MergeState::InProgress;

        if let Some(derivation) = self.complex_types[id].derivation.clone() {
            if derivation.base != QName::xsd(XSD_ANY_TYPE) {
                match self.types.get(&derivation.base).copied() {
                    Some(TypeId::Complex(base_id)) => {
                        self.merge_base(base_id, states)?;
                        let base = self.complex_types[base_id].clone();
                        let derived = &mut self.complex_types[id];
                        merge_derived(derived, base, derivation.method);
                    }
                    Some(TypeId::Simple(_)) => {}
                    None => {
                        self.recover(ParseError::new(format!(
                            "unknown base type '{}'",
                            derivation.base
                        )))?;
                    }
                }
            }
        }

        states[id] = MergeState::Done;
        Ok(())
    }

    /// References that do not resolve, in definition order
    fn check_references(&self) -> Vec<ParseError> {
        let mut errors = Vec::new();
        let mut check_type = |type_ref: &Option<TypeRef>, owner: &str, errors: &mut Vec<ParseError>| {
            if let Some(TypeRef::Named(name)) = type_ref {
                if !self.types.contains_key(name) {
                    errors.push(ParseError::new(format!("unknown type '{}' used by {}", name, owner)));
                }
            }
        };

        for decl in self.elements.values() {
            check_type(&decl.type_ref, &format!("element '{}'", decl.name), &mut errors);
        }
        for attribute in self.attributes.values() {
            check_type(&attribute.type_ref, &format!("attribute '{}'", attribute.name), &mut errors);
        }
        for simple in &self.simple_types {
            let owner = simple.display_name();
            match &simple.variety {
                SimpleVariety::Restriction { base, .. } => check_type(&Some(base.clone()), &owner, &mut errors),
                SimpleVariety::List { item } => check_type(&Some(item.clone()), &owner, &mut errors),
                SimpleVariety::Union { members } => {
                    for member in members {
                        check_type(&Some(member.clone()), &owner, &mut errors);
                    }
                }
                SimpleVariety::Builtin(_) => {}
            }
        }
        for complex in &self.complex_types {
            let owner = complex
                .name
                .as_ref()
                .map_or_else(|| "anonymous complex type".to_string(), |n| format!("complex type '{}'", n));
            for attribute in &complex.attributes {
                check_type(&attribute.type_ref, &owner, &mut errors);
                if attribute.is_ref && !self.attributes.contains_key(&attribute.name) {
                    errors.push(ParseError::new(format!(
                        "unknown attribute '{}' referenced by {}",
                        attribute.name, owner
                    )));
                }
            }
            match &complex.content {
                ContentType::Simple(type_ref) => check_type(&Some(type_ref.clone()), &owner, &mut errors),
                ContentType::Elements(group) => self.check_group(group, &owner, &mut errors, &mut check_type),
                ContentType::Empty => {}
            }
        }
        for (name, group) in &self.groups {
            self.check_group(group, &format!("group '{}'", name), &mut errors, &mut check_type);
        }
        for group in self.attribute_groups.values() {
            for attribute in &group.attributes {
                check_type(&attribute.type_ref, "attribute group", &mut errors);
            }
        }
        errors
    }

    fn check_group(
        &self,
        group: &ModelGroup,
        owner: &str,
        errors: &mut Vec<ParseError>,
        check_type: &mut dyn FnMut(&Option<TypeRef>, &str, &mut Vec<ParseError>),
    ) {
        for particle in &group.particles {
            match particle {
                Particle::Element { decl, .. } => check_type(&decl.type_ref, owner, errors),
                Particle::ElementRef { name, .. } if !self.elements.contains_key(name) => {
                    errors.push(ParseError::new(format!(
                        "unknown element '{}' referenced by {}",
                        name, owner
                    )));
                }
                Particle::GroupRef { name, .. } if !self.groups.contains_key(name) => {
                    errors.push(ParseError::new(format!(
                        "unknown group '{}' referenced by {}",
                        name, owner
                    )));
                }
                Particle::Group(nested) => self.check_group(nested, owner, errors, check_type),
                _ => {}
            }
        }
    }
}

/// Merge a (finalized) base type into a derived complex type
fn merge_derived(derived: &mut ComplexType, base: ComplexType, method: DerivationMethod) {
    let mut attributes = base.attributes;
    for attribute in derived.attributes.drain(..) {
        merge_attribute(&mut attributes, attribute);
    }
    derived.attributes = attributes;

    if method == DerivationMethod::Restriction {
        return;
    }

    if derived.any_attribute.is_none() {
        derived.any_attribute = base.any_attribute;
    }
    derived.mixed = derived.mixed || base.mixed;

    let own = std::mem::replace(&mut derived.content, ContentType::Empty);
    derived.content = match (base.content, own) {
        (ContentType::Elements(base_group), ContentType::Elements(own_group)) => {
            if own_group.is_empty() {
                ContentType::Elements(base_group)
            } else if base_group.is_empty() {
                ContentType::Elements(own_group)
            } else {
                let mut merged = ModelGroup::new(Compositor::Sequence);
                merged.particles.push(Particle::Group(base_group));
                merged.particles.push(Particle::Group(own_group));
                ContentType::Elements(merged)
            }
        }
        (base_content, ContentType::Empty) => base_content,
        (_, own) => own,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            xmlns:tns="urn:shapes" targetNamespace="urn:shapes" elementFormDefault="qualified">
        <xs:attributeGroup name="common">
            <xs:attribute name="id" type="xs:ID" use="required"/>
        </xs:attributeGroup>
        <xs:complexType name="shape">
            <xs:sequence>
                <xs:element name="label" type="xs:string"/>
            </xs:sequence>
            <xs:attributeGroup ref="tns:common"/>
        </xs:complexType>
        <xs:complexType name="circle">
            <xs:complexContent>
                <xs:extension base="tns:shape">
                    <xs:sequence>
                        <xs:element name="radius" type="xs:decimal"/>
                    </xs:sequence>
                    <xs:attribute name="filled" type="xs:boolean"/>
                </xs:extension>
            </xs:complexContent>
        </xs:complexType>
        <xs:element name="circle" type="tns:circle"/>
    </xs:schema>"#;

    fn shapes(name: &str) -> QName {
        QName::namespaced("urn:shapes", name)
    }

    #[test]
    fn test_builtins_registered() {
        let schema = XsdSchema::new(ValidationMode::Strict);
        assert!(schema.type_id(&TypeRef::Named(QName::xsd("string"))).is_some());
        assert!(matches!(schema.any_type(), TypeId::Complex(_)));
        assert!(schema.attribute(&QName::namespaced(XML_NAMESPACE, "lang")).is_some());
    }

    #[test]
    fn test_extension_merges_content_and_attributes() {
        let schema = XsdSchema::from_string(BASE).unwrap();
        assert_eq!(schema.target_namespace.as_deref(), Some("urn:shapes"));

        let Some(TypeId::Complex(id)) = schema.type_id(&TypeRef::Named(shapes("circle"))) else {
            panic!("circle is not a complex type");
        };
        let circle = schema.complex_type(id);
        let names: Vec<_> = circle.attributes.iter().map(|a| a.name.local_name.as_str()).collect();
        assert_eq!(names, ["id", "filled"]);

        let group = circle.model_group().unwrap();
        assert_eq!(group.particles.len(), 2);
        assert!(group.find_element(&schema, &shapes("label")).is_some());
        assert!(group.find_element(&schema, &shapes("radius")).is_some());
    }

    #[test]
    fn test_strict_build_rejects_unknown_type() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="root" type="missingType"/>
        </xs:schema>"#;
        let err = XsdSchema::from_string(xsd).unwrap_err();
        assert!(err.to_string().contains("missingType"));

        let lax = XsdSchema::from_string_with_mode(xsd, ValidationMode::Lax).unwrap();
        assert!(lax.element(&QName::local("root")).is_some());
        assert!(lax.build_errors()[0].message.contains("missingType"));
    }

    #[test]
    fn test_lax_build_records_defects() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="t">
                <xs:attributeGroup ref="nowhere"/>
            </xs:complexType>
            <xs:element name="root" type="t"/>
        </xs:schema>"#;
        assert!(XsdSchema::from_string(xsd).is_err());

        let lax = XsdSchema::from_string_with_mode(xsd, ValidationMode::Lax).unwrap();
        assert_eq!(lax.build_errors().len(), 1);
        assert!(lax.build_errors()[0].message.contains("nowhere"));
    }

    #[test]
    fn test_circular_derivation_is_reported() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:complexType name="a">
                <xs:complexContent><xs:extension base="b"/></xs:complexContent>
            </xs:complexType>
            <xs:complexType name="b">
                <xs:complexContent><xs:extension base="a"/></xs:complexContent>
            </xs:complexType>
        </xs:schema>"#;
        assert!(XsdSchema::from_string(xsd).is_err());
    }

    #[test]
    fn test_validate_and_iter_errors() {
        let schema = XsdSchema::from_string(BASE).unwrap();
        let valid = Document::from_string(
            r#"<c:circle xmlns:c="urn:shapes" id="c1"><c:label>x</c:label><c:radius>2.5</c:radius></c:circle>"#,
        )
        .unwrap();
        assert!(schema.is_valid(&valid));

        let invalid = Document::from_string(
            r#"<c:circle xmlns:c="urn:shapes"><c:label>x</c:label><c:radius>big</c:radius></c:circle>"#,
        )
        .unwrap();
        assert!(schema.validate(&invalid).is_err());
        assert_eq!(schema.iter_errors(&invalid).len(), 2);
    }
}
