//! Document Validation
//!
//! This module walks an instance document against a compiled schema. Every
//! element is validated and decoded in the same pass: attributes and text
//! are decoded by their simple types, children are matched against content
//! models and the decoded data is handed to the [`XmlSchemaConverter`].
//!
//! Errors are raised or collected by the [`ValidationContext`] according to
//! the validation mode, so a lax walk always yields a best-effort value.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value as JsonValue;

use super::attributes::AttributeUse;
use super::complex_types::{ComplexType, ContentType};
use super::elements::ElementDecl;
use super::groups::{match_content, Assignment, Matched, ModelError, ModelGroup};
use super::schemas::{TypeId, TypeRef, XsdSchema};
use super::simple_types::{self, SimpleType};
use super::validation::{ValidationContext, ValidationMode};
use super::wildcards::{ProcessContents, Wildcard};

use crate::converters::{ContentItem, ElementData, XmlSchemaConverter, XmlnsDecl};
use crate::documents::{Attribute, Document, Element};
use crate::error::{Error, Result, ValidationError};
use crate::namespaces::{NamespaceContext, QName, XML_NAMESPACE, XSI_NAMESPACE};

/// Validate and decode a document
///
/// A root element without a global declaration is an error in every mode:
/// nothing can be decoded without it.
pub(crate) fn decode_document(
    schema: &XsdSchema,
    doc: &Document,
    mode: ValidationMode,
) -> Result<(JsonValue, Vec<ValidationError>)> {
    let root = doc
        .root()
        .ok_or_else(|| ValidationError::new("Document has no root element"))?;

    let decl = schema.element(&root.qname).ok_or_else(|| {
        ValidationError::new(format!(
            "'{}' is not an element of the schema",
            root.lexical_name()
        ))
        .with_path(format!("/{}", root.lexical_name()))
        .with_line(root.line)
    })?;

    let mut decoder = DocumentDecoder::new(schema, mode);
    decoder.ctx.enter(&root.lexical_name(), None, root.line);
    let value = decoder.decode_element(root, Some(decl))?;
    decoder.ctx.exit();

    log::debug!(
        "decoded document rooted at '{}' ({} error(s), {} mode)",
        root.lexical_name(),
        decoder.ctx.errors.len(),
        mode.as_str()
    );
    Ok((value, decoder.ctx.errors))
}

struct DocumentDecoder<'s> {
    schema: &'s XsdSchema,
    converter: XmlSchemaConverter,
    ctx: ValidationContext,
    /// In-scope namespace declarations, one entry per open element
    scopes: Vec<NamespaceContext>,
}

impl<'s> DocumentDecoder<'s> {
    fn new(schema: &'s XsdSchema, mode: ValidationMode) -> Self {
        Self {
            schema,
            converter: XmlSchemaConverter::new(),
            ctx: ValidationContext::new(mode),
            scopes: Vec::new(),
        }
    }

    fn decode_element(&mut self, elem: &Element, decl: Option<&'s ElementDecl>) -> Result<JsonValue> {
        let scope = match self.scopes.last() {
            Some(outer) => outer.extended(&elem.namespaces),
            None => elem.namespaces.clone(),
        };
        self.scopes.push(scope);
        let value = self.decode_typed(elem, decl);
        self.scopes.pop();
        value
    }

    fn decode_typed(&mut self, elem: &Element, decl: Option<&'s ElementDecl>) -> Result<JsonValue> {
        let schema = self.schema;
        if let Some(decl) = decl.filter(|d| d.is_abstract) {
            self.ctx.validation_error(
                format!("Cannot use abstract element '{}' in an instance.", decl.name.local_name),
                None,
            )?;
        }

        let type_id = self.element_type(elem, decl)?;
        let nilled = self.is_nilled(elem, decl)?;

        let mut data = ElementData::new(elem.lexical_name());
        data.xmlns = xmlns_declarations(elem);
        match type_id {
            TypeId::Simple(id) => {
                self.decode_simple_element(elem, decl, schema.simple_type(id), nilled, &mut data)?
            }
            TypeId::Complex(id) => {
                self.decode_complex_element(elem, decl, schema.complex_type(id), nilled, &mut data)?
            }
        }
        if nilled {
            // A nilled element decodes to null, xsi:nil itself is not kept
            let nil_names: Vec<&str> = elem
                .attributes
                .iter()
                .filter(|a| is_xsi(a) && a.qname.local_name == "nil")
                .map(|a| a.name.as_str())
                .collect();
            data.attributes.retain(|(name, _)| !nil_names.contains(&name.as_str()));
        }
        Ok(self.converter.decode(data))
    }

    /// Type of an element: `xsi:type`, else the declared type, else `xs:anyType`
    fn element_type(&mut self, elem: &Element, decl: Option<&'s ElementDecl>) -> Result<TypeId> {
        let schema = self.schema;
        if let Some(value) = xsi_attribute(elem, "type") {
            let resolved = self
                .resolve_in_scope(value)
                .and_then(|name| schema.type_id(&TypeRef::Named(name)));
            match resolved {
                Some(id) => return Ok(id),
                None => self.ctx.validation_error(
                    format!("Unknown type '{}' in xsi:type.", value.trim()),
                    None,
                )?,
            }
        }

        let declared = decl
            .and_then(|d| d.type_ref.as_ref())
            .and_then(|t| schema.type_id(t));
        if declared.is_none() {
            if let Some(type_ref) = decl.and_then(|d| d.type_ref.as_ref()) {
                log::trace!("{} is not defined, decoding as xs:anyType", type_ref);
            }
        }
        Ok(declared.unwrap_or_else(|| schema.any_type()))
    }

    fn is_nilled(&mut self, elem: &Element, decl: Option<&ElementDecl>) -> Result<bool> {
        let Some(value) = xsi_attribute(elem, "nil") else {
            return Ok(false);
        };
        match value.trim() {
            "true" | "1" => {}
            "false" | "0" => return Ok(false),
            other => {
                self.ctx.validation_error(format!("Invalid xsi:nil value '{}'.", other), None)?;
                return Ok(false);
            }
        }

        if let Some(decl) = decl.filter(|d| !d.nillable) {
            self.ctx.validation_error(
                format!("Element '{}' is not nillable.", decl.name.local_name),
                None,
            )?;
            return Ok(false);
        }
        if !elem.children.is_empty() || elem.significant_text().is_some() {
            self.ctx
                .validation_error("An element with xsi:nil='true' must be empty.", None)?;
        }
        Ok(true)
    }

    fn decode_simple_element(
        &mut self,
        elem: &Element,
        decl: Option<&ElementDecl>,
        simple: &'s SimpleType,
        nilled: bool,
        data: &mut ElementData,
    ) -> Result<()> {
        for attr in &elem.attributes {
            if is_xsi(attr) {
                data.attributes.push((attr.name.clone(), JsonValue::String(attr.value.clone())));
            } else {
                self.ctx.validation_error(
                    format!("'{}' attribute not allowed for element.", attr.name),
                    Some(format!("The element has the simple type {}.", simple.display_name())),
                )?;
            }
        }
        if !elem.children.is_empty() {
            self.ctx.validation_error(
                format!(
                    "Child elements not allowed for an element of simple type {}.",
                    simple.display_name()
                ),
                None,
            )?;
        }
        if !nilled {
            data.text = self.decode_text(elem, decl, simple)?;
        }
        Ok(())
    }

    fn decode_complex_element(
        &mut self,
        elem: &Element,
        decl: Option<&ElementDecl>,
        complex: &'s ComplexType,
        nilled: bool,
        data: &mut ElementData,
    ) -> Result<()> {
        let schema = self.schema;
        if complex.is_abstract {
            let name = complex
                .name
                .as_ref()
                .map_or_else(|| "anonymous type".to_string(), |n| n.local_name.clone());
            self.ctx.validation_error(
                format!("Type '{}' is abstract and cannot be used by an element.", name),
                Some("Use xsi:type to select a concrete derived type.".to_string()),
            )?;
        }

        self.decode_attributes(elem, complex, data)?;
        if nilled {
            return Ok(());
        }

        match &complex.content {
            ContentType::Simple(type_ref) => {
                if !elem.children.is_empty() {
                    self.ctx
                        .validation_error("Child elements not allowed in simple content.", None)?;
                }
                let simple = match simple_types::resolve(schema, type_ref) {
                    Ok(simple) => simple,
                    Err(_) => simple_types::any_simple_type(schema)?,
                };
                data.text = self.decode_text(elem, decl, simple)?;
            }
            ContentType::Empty | ContentType::Elements(_) => {
                let group = complex.model_group();
                if let Some(text) = elem.significant_text() {
                    if complex.mixed {
                        data.text = Some(JsonValue::String(text.to_string()));
                    } else {
                        self.ctx.validation_error(
                            "Character data between child elements not allowed.",
                            Some(format!("Text '{}' found in element-only content.", text.trim())),
                        )?;
                    }
                }

                let assignments = match group {
                    Some(group) => {
                        let matched = match_content(schema, group, &elem.children);
                        if let Some(error) = &matched.error {
                            self.content_error(elem, error)?;
                        }
                        matched.assignments
                    }
                    None => {
                        if !elem.children.is_empty() {
                            self.ctx.validation_error(
                                "Element has empty content, child elements are not allowed.",
                                None,
                            )?;
                        }
                        vec![None; elem.children.len()]
                    }
                };
                self.decode_children(elem, group, &assignments, data)?;
            }
        }
        Ok(())
    }

    fn content_error(&mut self, elem: &Element, error: &ModelError) -> Result<()> {
        let reason = (!error.expected.is_empty())
            .then(|| format!("Tag ({}) expected.", error.expected.join(" | ")));
        let message = match elem.children.get(error.position) {
            Some(child) => format!(
                "Unexpected child with tag '{}' at position {}.",
                child.lexical_name(),
                error.position + 1
            ),
            None => format!(
                "The content of element '{}' is not complete.",
                elem.lexical_name()
            ),
        };
        self.ctx.validation_error(message, reason)
    }

    fn decode_children(
        &mut self,
        elem: &Element,
        group: Option<&'s ModelGroup>,
        assignments: &[Option<Assignment<'s>>],
        data: &mut ElementData,
    ) -> Result<()> {
        let schema = self.schema;
        let mut totals: HashMap<String, usize> = HashMap::new();
        for child in &elem.children {
            *totals.entry(child.lexical_name()).or_default() += 1;
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (child, assignment) in elem.children.iter().zip(assignments.iter().copied()) {
            let name = child.lexical_name();
            let index = if totals.get(&name).copied().unwrap_or(0) > 1 {
                let count = seen.entry(name.clone()).or_default();
                *count += 1;
                Some(*count)
            } else {
                None
            };

            self.ctx.enter(&name, index, child.line);
            let value = match assignment.map(|a| a.matched) {
                Some(Matched::Element(decl)) => self.decode_element(child, Some(decl))?,
                Some(Matched::Unresolved) => self.decode_element(child, schema.element(&child.qname))?,
                Some(Matched::Wildcard(wildcard)) => self.decode_wildcard_child(child, wildcard)?,
                None => {
                    // Outside the model: best effort with the closest declaration
                    let decl = group
                        .and_then(|g| g.find_element(schema, &child.qname))
                        .or_else(|| schema.element(&child.qname));
                    self.decode_element(child, decl)?
                }
            };
            self.ctx.exit();

            data.content.push(ContentItem {
                name,
                value,
                repeats: assignment.map_or(false, |a| a.repeats),
            });
        }
        Ok(())
    }

    fn decode_wildcard_child(&mut self, child: &Element, wildcard: &Wildcard) -> Result<JsonValue> {
        let schema = self.schema;
        match wildcard.process_contents {
            ProcessContents::Skip => Ok(self.decode_skipped(child)),
            ProcessContents::Lax => self.decode_element(child, schema.element(&child.qname)),
            ProcessContents::Strict => match schema.element(&child.qname) {
                Some(decl) => self.decode_element(child, Some(decl)),
                None => {
                    self.ctx.validation_error(
                        format!(
                            "No global declaration found for element '{}' matched by a strict wildcard.",
                            child.lexical_name()
                        ),
                        None,
                    )?;
                    self.decode_element(child, None)
                }
            },
        }
    }

    /// Convert an element without validating it
    fn decode_skipped(&self, elem: &Element) -> JsonValue {
        let mut data = ElementData::new(elem.lexical_name());
        data.xmlns = xmlns_declarations(elem);
        data.attributes = elem
            .attributes
            .iter()
            .map(|a| (a.name.clone(), JsonValue::String(a.value.clone())))
            .collect();
        data.text = if elem.children.is_empty() {
            elem.text.clone().map(JsonValue::String)
        } else {
            elem.significant_text().map(|t| JsonValue::String(t.to_string()))
        };
        for child in &elem.children {
            data.content.push(ContentItem {
                name: child.lexical_name(),
                value: self.decode_skipped(child),
                repeats: false,
            });
        }
        self.converter.decode(data)
    }

    // Attributes

    fn decode_attributes(&mut self, elem: &Element, complex: &'s ComplexType, data: &mut ElementData) -> Result<()> {
        for attr in &elem.attributes {
            if is_xsi(attr) {
                data.attributes.push((attr.name.clone(), JsonValue::String(attr.value.clone())));
                continue;
            }
            let value = match complex.attribute(&attr.qname) {
                Some(attribute) if attribute.is_prohibited() => {
                    self.ctx
                        .validation_error(format!("Attribute '{}' is prohibited.", attr.name), None)?;
                    JsonValue::String(attr.value.clone())
                }
                Some(attribute) => self.decode_attribute(attribute, &attr.value)?,
                None => self.decode_wildcard_attribute(complex.any_attribute.as_ref(), attr)?,
            };
            data.attributes.push((attr.name.clone(), value));
        }

        for attribute in &complex.attributes {
            if attribute.is_prohibited() || elem.get_attribute_qname(&attribute.name).is_some() {
                continue;
            }
            let lexical_name = self.lexical_attribute_name(&attribute.name);
            if attribute.is_required() {
                self.ctx.validation_error(
                    format!("Missing required attribute '{}'.", lexical_name),
                    None,
                )?;
                continue;
            }
            let global = self.referenced_attribute(attribute);
            let constraint = attribute
                .fixed
                .as_deref()
                .or(attribute.default.as_deref())
                .or_else(|| global.and_then(|g| g.fixed.as_deref().or(g.default.as_deref())));
            if let Some(lexical) = constraint {
                let value = self.decode_attribute(attribute, lexical)?;
                data.attributes.push((lexical_name, value));
            }
        }
        Ok(())
    }

    fn referenced_attribute(&self, attribute: &AttributeUse) -> Option<&'s AttributeUse> {
        if attribute.is_ref {
            self.schema.attribute(&attribute.name)
        } else {
            None
        }
    }

    fn decode_attribute(&mut self, attribute: &AttributeUse, lexical: &str) -> Result<JsonValue> {
        let schema = self.schema;
        let global = self.referenced_attribute(attribute);
        let type_ref = attribute
            .type_ref
            .as_ref()
            .or_else(|| global.and_then(|g| g.type_ref.as_ref()));
        let simple = match type_ref.map(|t| simple_types::resolve(schema, t)) {
            Some(Ok(simple)) => simple,
            _ => simple_types::any_simple_type(schema)?,
        };
        let fixed = attribute
            .fixed
            .as_deref()
            .or_else(|| global.and_then(|g| g.fixed.as_deref()));
        self.decode_value(simple, lexical, fixed)
    }

    fn decode_wildcard_attribute(&mut self, wildcard: Option<&Wildcard>, attr: &Attribute) -> Result<JsonValue> {
        let schema = self.schema;
        let raw = JsonValue::String(attr.value.clone());
        let Some(wildcard) = wildcard.filter(|w| w.matches(attr.qname.namespace.as_deref())) else {
            self.ctx
                .validation_error(format!("'{}' attribute not allowed for element.", attr.name), None)?;
            return Ok(raw);
        };

        match (wildcard.process_contents, schema.attribute(&attr.qname)) {
            (ProcessContents::Skip, _) => Ok(raw),
            (_, Some(global)) => self.decode_attribute(global, &attr.value),
            (ProcessContents::Lax, None) => Ok(raw),
            (ProcessContents::Strict, None) => {
                self.ctx.validation_error(
                    format!(
                        "No global declaration found for attribute '{}' matched by a strict wildcard.",
                        attr.name
                    ),
                    None,
                )?;
                Ok(raw)
            }
        }
    }

    // Values

    fn decode_text(
        &mut self,
        elem: &Element,
        decl: Option<&ElementDecl>,
        simple: &SimpleType,
    ) -> Result<Option<JsonValue>> {
        let text = elem.text.as_deref().unwrap_or("");
        let constraint = decl.and_then(ElementDecl::value_constraint);
        let lexical = match constraint {
            Some(value) if text.is_empty() => value,
            _ => text,
        };
        let fixed = decl.and_then(|d| d.fixed.as_deref());
        let value = self.decode_value(simple, lexical, fixed)?;

        if elem.text.is_none() && constraint.is_none() && value == JsonValue::String(String::new()) {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Decode a lexical value; invalid values are reported and kept as text
    fn decode_value(&mut self, simple: &SimpleType, lexical: &str, fixed: Option<&str>) -> Result<JsonValue> {
        let schema = self.schema;
        match simple.decode(schema, lexical) {
            Ok(value) => {
                if let Some(fixed) = fixed {
                    let same = simple
                        .decode(schema, fixed)
                        .map(|f| value.compare(&f).map_or(value == f, |o| o == Ordering::Equal))
                        .unwrap_or(false);
                    if !same {
                        self.ctx.validation_error(
                            format!("Value '{}' does not match the fixed value '{}'.", lexical.trim(), fixed),
                            None,
                        )?;
                    }
                }
                if simple.is_id(schema) {
                    self.ctx.register_id(lexical.trim())?;
                }
                Ok(value.to_json())
            }
            Err(error) => {
                let reason = match error {
                    Error::Value(message) => message,
                    other => other.to_string(),
                };
                self.ctx.validation_error(
                    format!("failed validating '{}' with {}", lexical, simple.display_name()),
                    Some(reason),
                )?;
                Ok(JsonValue::String(lexical.to_string()))
            }
        }
    }

    // Namespaces

    fn resolve_in_scope(&self, value: &str) -> Option<QName> {
        self.scopes.last()?.resolve(value).ok()
    }

    /// Prefixed name of an attribute added from a default value
    fn lexical_attribute_name(&self, name: &QName) -> String {
        match name.namespace.as_deref() {
            None => name.local_name.clone(),
            Some(XML_NAMESPACE) => format!("xml:{}", name.local_name),
            Some(namespace) => self
                .scopes
                .last()
                .and_then(|scope| scope.iter().find(|(_, uri)| *uri == namespace))
                .map(|(prefix, _)| format!("{}:{}", prefix, name.local_name))
                .unwrap_or_else(|| name.local_name.clone()),
        }
    }
}

fn xsi_attribute<'e>(elem: &'e Element, local_name: &str) -> Option<&'e str> {
    elem.get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, local_name))
}

fn is_xsi(attr: &Attribute) -> bool {
    attr.qname.is_in(Some(XSI_NAMESPACE))
}

/// Namespace declarations made on an element, default namespace first
fn xmlns_declarations(elem: &Element) -> XmlnsDecl {
    let mut declarations = Vec::new();
    if let Some(uri) = elem.namespaces.get_default_namespace() {
        declarations.push((String::new(), uri.to_string()));
    } else if elem.namespaces.undeclares_default_namespace() {
        declarations.push((String::new(), String::new()));
    }
    declarations.extend(
        elem.namespaces
            .iter()
            .map(|(prefix, uri)| (prefix.to_string(), uri.to_string())),
    );
    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const LIBRARY_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="library">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="book" type="bookType" maxOccurs="unbounded"/>
                    <xs:element name="note" type="xs:string" minOccurs="0" nillable="true"/>
                    <xs:any processContents="skip" minOccurs="0"/>
                </xs:sequence>
                <xs:attribute name="version" type="xs:decimal" default="1.0"/>
                <xs:attribute name="open" type="xs:boolean"/>
            </xs:complexType>
        </xs:element>
        <xs:complexType name="bookType">
            <xs:sequence>
                <xs:element name="title" type="titleType"/>
                <xs:element name="year" type="xs:gYear" minOccurs="0"/>
                <xs:element name="pages" type="xs:positiveInteger"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:ID" use="required"/>
            <xs:attribute name="format" type="xs:string" fixed="paper"/>
        </xs:complexType>
        <xs:complexType name="titleType">
            <xs:simpleContent>
                <xs:extension base="xs:string">
                    <xs:attribute name="lang" type="xs:language"/>
                </xs:extension>
            </xs:simpleContent>
        </xs:complexType>
    </xs:schema>"#;

    fn decode(xml: &str, mode: ValidationMode) -> Result<(JsonValue, Vec<ValidationError>)> {
        let schema = XsdSchema::from_string(LIBRARY_XSD).unwrap();
        let doc = Document::from_string(xml).unwrap();
        decode_document(&schema, &doc, mode)
    }

    #[test]
    fn test_decode_valid_document() {
        let xml = r#"<library open="true">
            <book id="b1"><title lang="en">Dune</title><year>1965</year><pages>412</pages></book>
            <book id="b2"><title>Emma</title><pages>474</pages></book>
        </library>"#;

        let (value, errors) = decode(xml, ValidationMode::Strict).unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            value,
            json!({
                "@open": true,
                "@version": "1.0",
                "book": [
                    {"@id": "b1", "@format": "paper", "title": {"@lang": "en", "$": "Dune"}, "year": "1965", "pages": 412},
                    {"@id": "b2", "@format": "paper", "title": "Emma", "pages": 474}
                ]
            })
        );
    }

    #[test]
    fn test_long_numbers_decode_exactly() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="n">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="d" type="xs:decimal"/>
                        <xs:element name="i" type="xs:integer"/>
                        <xs:element name="small">
                            <xs:simpleType>
                                <xs:restriction base="xs:decimal">
                                    <xs:maxInclusive value="99999999999999999999999999999999.5"/>
                                </xs:restriction>
                            </xs:simpleType>
                        </xs:element>
                    </xs:sequence>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        let doc = Document::from_string(
            "<n><d>12345678901234567890123456789.5</d>\
             <i>1234567890123456789012345678901234567890</i>\
             <small>99999999999999999999999999999999.49</small></n>",
        )
        .unwrap();

        let (value, errors) = decode_document(&schema, &doc, ValidationMode::Strict).unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            value,
            json!({
                "d": "12345678901234567890123456789.5",
                "i": "1234567890123456789012345678901234567890",
                "small": "99999999999999999999999999999999.49"
            })
        );

        let over = Document::from_string(
            "<n><d>1</d><i>2</i><small>99999999999999999999999999999999.51</small></n>",
        )
        .unwrap();
        let err = decode_document(&schema, &over, ValidationMode::Strict).unwrap_err();
        assert!(err.to_string().contains("maxInclusive"));
    }

    #[test]
    fn test_unknown_root_is_fatal_in_every_mode() {
        for mode in [ValidationMode::Strict, ValidationMode::Lax, ValidationMode::Skip] {
            let err = decode("<shelf/>", mode).unwrap_err();
            assert!(err.to_string().contains("'shelf' is not an element of the schema"));
        }
    }

    #[test]
    fn test_strict_stops_at_first_error() {
        let xml = r#"<library><book id="b1"><title>T</title><pages>zero</pages></book></library>"#;
        match decode(xml, ValidationMode::Strict).unwrap_err() {
            Error::Validation(error) => {
                assert!(error.message.contains("failed validating 'zero'"));
                assert_eq!(error.path.as_deref(), Some("/library/book/pages"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lax_collects_errors_and_keeps_values() {
        let xml = r#"<library>
            <book id="x"><title>A</title><pages>-3</pages></book>
            <book id="x" format="ebook" color="red"><pages>10</pages></book>
        </library>"#;

        let (value, errors) = decode(xml, ValidationMode::Lax).unwrap();
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("failed validating '-3'")));
        assert!(messages.iter().any(|m| m.contains("Duplicate ID value: 'x'")));
        assert!(messages.iter().any(|m| m.contains("does not match the fixed value")));
        assert!(messages.iter().any(|m| m.contains("'color' attribute not allowed")));
        assert!(messages.iter().any(|m| m.contains("Unexpected child with tag 'pages'")));

        assert_eq!(value["book"][0]["pages"], json!("-3"));
        assert_eq!(value["book"][1]["@color"], json!("red"));
        assert_eq!(
            errors.iter().find(|e| e.message.contains("-3")).unwrap().path.as_deref(),
            Some("/library/book[1]/pages")
        );
    }

    #[test]
    fn test_incomplete_content() {
        let xml = r#"<library><book id="b"><title>A</title></book></library>"#;
        let (_, errors) = decode(xml, ValidationMode::Lax).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "The content of element 'book' is not complete.");
        assert_eq!(errors[0].reason.as_deref(), Some("Tag (pages) expected."));
    }

    #[test]
    fn test_missing_required_attribute() {
        let xml = r#"<library><book><title>A</title><pages>1</pages></book></library>"#;
        let (_, errors) = decode(xml, ValidationMode::Lax).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Missing required attribute 'id'.");
    }

    #[test]
    fn test_nil_and_skip_wildcard() {
        let xml = r#"<library xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
            <book id="b"><title>A</title><pages>1</pages></book>
            <note xsi:nil="true"/>
            <extra kind="free"><anything>goes</anything></extra>
        </library>"#;

        let (value, errors) = decode(xml, ValidationMode::Strict).unwrap();
        assert!(errors.is_empty());
        assert_eq!(value["note"], JsonValue::Null);
        assert_eq!(value["extra"], json!({"@kind": "free", "anything": "goes"}));
        assert_eq!(value["@xmlns:xsi"], json!("http://www.w3.org/2001/XMLSchema-instance"));
    }

    #[test]
    fn test_skip_mode_reports_nothing() {
        let xml = r#"<library><book id="b"><pages>many</pages></book></library>"#;
        let (value, errors) = decode(xml, ValidationMode::Skip).unwrap();
        assert!(errors.is_empty());
        assert_eq!(value["book"][0]["pages"], json!("many"));
    }

    #[test]
    fn test_text_in_element_only_content() {
        let xml = r#"<library>stray<book id="b"><title>A</title><pages>1</pages></book></library>"#;
        let (_, errors) = decode(xml, ValidationMode::Lax).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Character data"));
    }
}
