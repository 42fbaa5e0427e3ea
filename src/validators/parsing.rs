//! XSD schema document parsing
//!
//! Reads schema documents (the main file plus its includes and imports) and
//! registers their components in an [`XsdSchema`]. References between
//! components are kept as qualified names and resolved later.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::attributes::{merge_attribute, AttributeGroup, AttributeUse, AttributeUseKind};
use super::complex_types::{ComplexType, ContentType, Derivation, DerivationMethod};
use super::elements::ElementDecl;
use super::facets::Facets;
use super::groups::{Compositor, ModelGroup, Particle};
use super::particles::{parse_occurs, Occurs};
use super::schemas::{TypeId, TypeRef, XsdSchema};
use super::simple_types::{SimpleType, SimpleVariety};
use super::validation::ValidationMode;
use super::wildcards::{NamespaceConstraint, ProcessContents, Wildcard};

use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result};
use crate::loaders::{resolve_location, Loader};
use crate::namespaces::{NamespaceContext, QName, XML_NAMESPACE, XSD_NAMESPACE};

/// XSD element names
mod xsd_tags {
    pub const SCHEMA: &str = "schema";
    pub const ANNOTATION: &str = "annotation";
    pub const INCLUDE: &str = "include";
    pub const IMPORT: &str = "import";
    pub const REDEFINE: &str = "redefine";
    pub const ELEMENT: &str = "element";
    pub const ATTRIBUTE: &str = "attribute";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const GROUP: &str = "group";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const NOTATION: &str = "notation";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const EXTENSION: &str = "extension";
    pub const RESTRICTION: &str = "restriction";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
    pub const UNIQUE: &str = "unique";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const FORM: &str = "form";
    pub const NILLABLE: &str = "nillable";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
    pub const PROCESS_CONTENTS: &str = "processContents";
}

/// Form default for elements and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Unqualified (default)
    #[default]
    Unqualified,
    /// Qualified
    Qualified,
}

impl FormDefault {
    /// Parse from string value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// Check if qualified
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified)
    }
}

/// Settings of the schema document being parsed
#[derive(Debug, Clone)]
struct FileContext {
    target_namespace: Option<String>,
    element_form: FormDefault,
    attribute_form: FormDefault,
    namespaces: NamespaceContext,
    /// Included without a targetNamespace: unqualified references take the includer's
    chameleon: bool,
    base_dir: Option<PathBuf>,
    source: String,
    /// Include/import nesting, 0 for the main document
    depth: usize,
}

impl FileContext {
    fn resolve_qname(&self, elem: &Element, value: &str) -> Result<QName> {
        let scope = self.namespaces.extended(&elem.namespaces);
        let qname = match scope.resolve(value) {
            Ok(qname) => qname,
            Err(error) => match value.trim().split_once(':') {
                Some(("xs" | "xsd", local)) => QName::xsd(local),
                _ => return Err(error),
            },
        };
        if self.chameleon && qname.namespace.is_none() {
            return Ok(QName::new(self.target_namespace.clone(), qname.local_name));
        }
        Ok(qname)
    }

    fn global_name(&self, local: &str) -> QName {
        QName::new(self.target_namespace.clone(), local.trim())
    }

    fn location(&self, elem: &Element) -> String {
        format!("{}: line {}", self.source, elem.line)
    }
}

/// Parser building an [`XsdSchema`] from schema documents
pub struct SchemaParser<'a> {
    schema: &'a mut XsdSchema,
    loader: Loader,
    mode: ValidationMode,
    loaded: HashSet<PathBuf>,
}

impl<'a> SchemaParser<'a> {
    /// Create a parser filling `schema`
    pub fn new(schema: &'a mut XsdSchema, mode: ValidationMode) -> Self {
        let loader = schema.loader().clone();
        Self {
            schema,
            loader,
            mode,
            loaded: HashSet::new(),
        }
    }

    /// Parse the main schema document from a file
    pub fn parse_file(&mut self, path: &Path) -> Result<()> {
        log::debug!("parsing schema {} ({} build)", path.display(), self.mode.as_str());
        self.loaded.insert(canonical(path));
        let doc = Document::from_file(path, &self.loader)?;
        let root = main_root(&doc)?;
        let ctx = self.file_context(root, path.parent().map(Path::to_path_buf), path.display().to_string(), None)?;
        self.schema.target_namespace = ctx.target_namespace.clone();
        self.parse_schema(&ctx, root)
    }

    /// Parse the main schema document from a string
    pub fn parse_string(&mut self, xsd: &str) -> Result<()> {
        let doc = Document::from_string(xsd)?;
        let root = main_root(&doc)?;
        let ctx = self.file_context(root, None, "<string>".to_string(), None)?;
        self.schema.target_namespace = ctx.target_namespace.clone();
        self.parse_schema(&ctx, root)
    }

    fn file_context(
        &mut self,
        root: &Element,
        base_dir: Option<PathBuf>,
        source: String,
        including: Option<&FileContext>,
    ) -> Result<FileContext> {
        let own_namespace = root
            .get_attribute(xsd_attrs::TARGET_NAMESPACE)
            .map(str::to_string)
            .filter(|ns| !ns.is_empty());
        let chameleon = own_namespace.is_none()
            && including.map_or(false, |c| c.target_namespace.is_some());
        let target_namespace = match (own_namespace, including) {
            (Some(ns), _) => Some(ns),
            (None, Some(parent)) => parent.target_namespace.clone(),
            (None, None) => None,
        };

        let mut ctx = FileContext {
            target_namespace,
            element_form: FormDefault::Unqualified,
            attribute_form: FormDefault::Unqualified,
            namespaces: root.namespaces.clone(),
            chameleon,
            base_dir,
            source,
            depth: including.map_or(0, |c| c.depth + 1),
        };
        for (attr, form) in [
            (xsd_attrs::ELEMENT_FORM_DEFAULT, &mut ctx.element_form),
            (xsd_attrs::ATTRIBUTE_FORM_DEFAULT, &mut ctx.attribute_form),
        ] {
            if let Some(value) = root.get_attribute(attr) {
                match FormDefault::parse(value) {
                    Some(parsed) => *form = parsed,
                    None => self.schema.recover(
                        ParseError::new(format!("wrong value '{}' for '{}'", value, attr))
                            .with_location(format!("{}: line {}", ctx.source, root.line)),
                    )?,
                }
            }
        }
        Ok(ctx)
    }

    /// Record a tolerated defect, or fail in strict mode
    fn recover(&mut self, ctx: &FileContext, elem: &Element, error: Error) -> Result<()> {
        let error = match error {
            Error::Parse(parse) if parse.location.is_some() => parse,
            Error::Parse(parse) => parse.with_location(ctx.location(elem)),
            other => ParseError::new(other.to_string()).with_location(ctx.location(elem)),
        };
        self.schema.recover(error)
    }

    /// Run `f`, recovering from its error in lax mode
    fn attempt<T>(
        &mut self,
        ctx: &FileContext,
        elem: &Element,
        result: Result<T>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                self.recover(ctx, elem, error)?;
                Ok(None)
            }
        }
    }

    fn parse_schema(&mut self, ctx: &FileContext, root: &Element) -> Result<()> {
        for child in xsd_children(root) {
            let result = match child.local_name() {
                xsd_tags::ANNOTATION | xsd_tags::NOTATION => Ok(()),
                xsd_tags::INCLUDE => self.parse_include(ctx, child),
                xsd_tags::IMPORT => self.parse_import(ctx, child),
                xsd_tags::REDEFINE => Err(ParseError::new("xs:redefine is not supported").into()),
                xsd_tags::ELEMENT => self.parse_global_element(ctx, child),
                xsd_tags::ATTRIBUTE => self
                    .parse_attribute(ctx, child, true)
                    .and_then(|attribute| self.schema.register_attribute(attribute)),
                xsd_tags::COMPLEX_TYPE => self.parse_named_type(ctx, child, true),
                xsd_tags::SIMPLE_TYPE => self.parse_named_type(ctx, child, false),
                xsd_tags::GROUP => self.parse_named_group(ctx, child),
                xsd_tags::ATTRIBUTE_GROUP => self.parse_named_attribute_group(ctx, child),
                other => Err(ParseError::new(format!("unexpected schema component 'xs:{}'", other)).into()),
            };
            if let Err(error) = result {
                self.recover(ctx, child, error)?;
            }
        }
        Ok(())
    }

    // Includes and imports

    fn parse_include(&mut self, ctx: &FileContext, elem: &Element) -> Result<()> {
        let location = required(elem, xsd_attrs::SCHEMA_LOCATION)?;
        self.loader.limits().check_schema_depth(ctx.depth + 1)?;
        let path = resolve_location(ctx.base_dir.as_deref(), location);
        let Some(doc) = self.load_once(&path)? else {
            return Ok(());
        };
        let root = main_root(&doc)?;
        let included = self.file_context(
            root,
            path.parent().map(Path::to_path_buf),
            path.display().to_string(),
            Some(ctx),
        )?;
        if included.target_namespace != ctx.target_namespace {
            return Err(ParseError::new(format!(
                "included schema '{}' has a different targetNamespace",
                location
            ))
            .into());
        }
        log::debug!("including {}", path.display());
        self.parse_schema(&included, root)
    }

    fn parse_import(&mut self, ctx: &FileContext, elem: &Element) -> Result<()> {
        let namespace = elem
            .get_attribute(xsd_attrs::NAMESPACE)
            .map(str::to_string)
            .filter(|ns| !ns.is_empty());
        if namespace.as_deref() == Some(XML_NAMESPACE) {
            log::trace!("skipping import of the XML namespace, its attributes are built in");
            return Ok(());
        }
        if namespace.is_some() && namespace == ctx.target_namespace {
            return Err(ParseError::new("a schema cannot import its own targetNamespace").into());
        }
        let Some(location) = elem.get_attribute(xsd_attrs::SCHEMA_LOCATION) else {
            log::debug!(
                "import of namespace {:?} has no schemaLocation, nothing loaded",
                namespace
            );
            return Ok(());
        };

        self.loader.limits().check_schema_depth(ctx.depth + 1)?;
        let path = resolve_location(ctx.base_dir.as_deref(), location);
        let Some(doc) = self.load_once(&path)? else {
            return Ok(());
        };
        let root = main_root(&doc)?;
        let mut imported = self.file_context(
            root,
            path.parent().map(Path::to_path_buf),
            path.display().to_string(),
            None,
        )?;
        imported.depth = ctx.depth + 1;
        if imported.target_namespace != namespace {
            return Err(ParseError::new(format!(
                "imported schema '{}' has targetNamespace {:?}, expected {:?}",
                location, imported.target_namespace, namespace
            ))
            .into());
        }
        log::debug!("importing {} for namespace {:?}", path.display(), namespace);
        self.parse_schema(&imported, root)
    }

    fn load_once(&mut self, path: &Path) -> Result<Option<Document>> {
        if !self.loaded.insert(canonical(path)) {
            log::trace!("{} already loaded", path.display());
            return Ok(None);
        }
        Document::from_file(path, &self.loader).map(Some)
    }

    // Elements

    fn parse_global_element(&mut self, ctx: &FileContext, elem: &Element) -> Result<()> {
        let name = ctx.global_name(required(elem, xsd_attrs::NAME)?);
        let decl = self.parse_element_decl(ctx, elem, name)?;
        self.schema.register_element(decl)
    }

    fn parse_element_decl(&mut self, ctx: &FileContext, elem: &Element, name: QName) -> Result<ElementDecl> {
        let mut decl = ElementDecl::new(name);
        decl.nillable = parse_bool(elem, xsd_attrs::NILLABLE)?;
        decl.is_abstract = parse_bool(elem, xsd_attrs::ABSTRACT)?;
        decl.default = elem.get_attribute(xsd_attrs::DEFAULT).map(str::to_string);
        decl.fixed = elem.get_attribute(xsd_attrs::FIXED).map(str::to_string);
        if decl.default.is_some() && decl.fixed.is_some() {
            self.recover(
                ctx,
                elem,
                ParseError::new("'default' and 'fixed' attributes are mutually exclusive").into(),
            )?;
        }

        if let Some(type_name) = elem.get_attribute(xsd_attrs::TYPE) {
            let resolved = ctx.resolve_qname(elem, type_name);
            decl.type_ref = self.attempt(ctx, elem, resolved)?.map(TypeRef::Named);
        }
        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_tags::COMPLEX_TYPE | xsd_tags::SIMPLE_TYPE if decl.type_ref.is_some() => {
                    self.recover(
                        ctx,
                        child,
                        ParseError::new("an element cannot have both a 'type' attribute and an inline type").into(),
                    )?;
                }
                xsd_tags::COMPLEX_TYPE => {
                    let id = self.parse_complex_type(ctx, child, None)?;
                    decl.type_ref = Some(TypeRef::Id(id));
                }
                xsd_tags::SIMPLE_TYPE => {
                    let id = self.parse_simple_type(ctx, child, None)?;
                    decl.type_ref = Some(TypeRef::Id(id));
                }
                xsd_tags::ANNOTATION | xsd_tags::KEY | xsd_tags::KEYREF | xsd_tags::UNIQUE => {
                    log::trace!("ignoring xs:{} in element '{}'", child.local_name(), decl.name);
                }
                other => {
                    self.recover(
                        ctx,
                        child,
                        ParseError::new(format!("unexpected 'xs:{}' in element declaration", other)).into(),
                    )?;
                }
            }
        }
        Ok(decl)
    }

    fn parse_local_element(&mut self, ctx: &FileContext, elem: &Element) -> Result<Particle> {
        let occurs = self.occurs(ctx, elem)?;
        if let Some(reference) = elem.get_attribute(xsd_attrs::REF) {
            let name = ctx.resolve_qname(elem, reference)?;
            return Ok(Particle::ElementRef { name, occurs });
        }

        let local = required(elem, xsd_attrs::NAME)?;
        let form = match elem.get_attribute(xsd_attrs::FORM) {
            Some(value) => FormDefault::parse(value)
                .ok_or_else(|| ParseError::new(format!("wrong value '{}' for 'form'", value)))?,
            None => ctx.element_form,
        };
        let name = if form.is_qualified() {
            ctx.global_name(local)
        } else {
            QName::local(local.trim())
        };
        let decl = self.parse_element_decl(ctx, elem, name)?;
        Ok(Particle::Element {
            decl: Box::new(decl),
            occurs,
        })
    }

    fn occurs(&mut self, ctx: &FileContext, elem: &Element) -> Result<Occurs> {
        let parsed = parse_occurs(
            elem.get_attribute(xsd_attrs::MIN_OCCURS),
            elem.get_attribute(xsd_attrs::MAX_OCCURS),
        );
        Ok(self.attempt(ctx, elem, parsed)?.unwrap_or_default())
    }

    // Attributes

    fn parse_attribute(&mut self, ctx: &FileContext, elem: &Element, global: bool) -> Result<AttributeUse> {
        let mut attribute = if let Some(reference) = elem.get_attribute(xsd_attrs::REF).filter(|_| !global) {
            let mut attribute = AttributeUse::new(ctx.resolve_qname(elem, reference)?);
            attribute.is_ref = true;
            attribute
        } else {
            let local = required(elem, xsd_attrs::NAME)?;
            let qualified = match elem.get_attribute(xsd_attrs::FORM) {
                Some(value) => FormDefault::parse(value)
                    .ok_or_else(|| ParseError::new(format!("wrong value '{}' for 'form'", value)))?
                    .is_qualified(),
                None => ctx.attribute_form.is_qualified(),
            };
            let name = if global || qualified {
                ctx.global_name(local)
            } else {
                QName::local(local.trim())
            };
            AttributeUse::new(name)
        };

        if let Some(use_value) = elem.get_attribute(xsd_attrs::USE).filter(|_| !global) {
            attribute.use_kind = AttributeUseKind::parse(use_value)?;
        }
        attribute.default = elem.get_attribute(xsd_attrs::DEFAULT).map(str::to_string);
        attribute.fixed = elem.get_attribute(xsd_attrs::FIXED).map(str::to_string);

        if let Some(type_name) = elem.get_attribute(xsd_attrs::TYPE) {
            let resolved = ctx.resolve_qname(elem, type_name);
            attribute.type_ref = self.attempt(ctx, elem, resolved)?.map(TypeRef::Named);
        }
        for child in xsd_children(elem) {
            if child.local_name() == xsd_tags::SIMPLE_TYPE {
                let id = self.parse_simple_type(ctx, child, None)?;
                attribute.type_ref = Some(TypeRef::Id(id));
            }
        }
        Ok(attribute)
    }

    /// Parse an `xs:attribute`, `xs:attributeGroup` or `xs:anyAttribute` child
    ///
    /// Returns `false` when `child` is not an attribute declaration.
    fn parse_attribute_item(
        &mut self,
        ctx: &FileContext,
        child: &Element,
        attributes: &mut Vec<AttributeUse>,
        group_refs: &mut Vec<QName>,
        any_attribute: &mut Option<Wildcard>,
    ) -> Result<bool> {
        match child.local_name() {
            xsd_tags::ATTRIBUTE => {
                let parsed = self.parse_attribute(ctx, child, false);
                if let Some(attribute) = self.attempt(ctx, child, parsed)? {
                    merge_attribute(attributes, attribute);
                }
            }
            xsd_tags::ATTRIBUTE_GROUP => {
                let reference = required(child, xsd_attrs::REF).and_then(|r| ctx.resolve_qname(child, r));
                if let Some(name) = self.attempt(ctx, child, reference)? {
                    group_refs.push(name);
                }
            }
            xsd_tags::ANY_ATTRIBUTE => {
                let parsed = self.parse_wildcard(ctx, child);
                *any_attribute = self.attempt(ctx, child, parsed)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn parse_named_attribute_group(&mut self, ctx: &FileContext, elem: &Element) -> Result<()> {
        let name = ctx.global_name(required(elem, xsd_attrs::NAME)?);
        let mut group = AttributeGroup {
            name: Some(name.clone()),
            ..AttributeGroup::default()
        };
        for child in xsd_children(elem) {
            let handled = self.parse_attribute_item(
                ctx,
                child,
                &mut group.attributes,
                &mut group.group_refs,
                &mut group.any_attribute,
            )?;
            if !handled && child.local_name() != xsd_tags::ANNOTATION {
                self.unexpected(ctx, child, "attribute group")?;
            }
        }
        self.schema.register_attribute_group(name, group)
    }

    fn parse_wildcard(&mut self, ctx: &FileContext, elem: &Element) -> Result<Wildcard> {
        let namespaces = NamespaceConstraint::from_namespace_attr(
            elem.get_attribute(xsd_attrs::NAMESPACE).unwrap_or("##any"),
            ctx.target_namespace.as_deref(),
        )?;
        let process_contents = match elem.get_attribute(xsd_attrs::PROCESS_CONTENTS) {
            Some(value) => ProcessContents::parse(value)?,
            None => ProcessContents::Strict,
        };
        Ok(Wildcard {
            namespaces,
            process_contents,
            occurs: self.occurs(ctx, elem)?,
        })
    }

    // Types

    fn parse_named_type(&mut self, ctx: &FileContext, elem: &Element, complex: bool) -> Result<()> {
        let name = ctx.global_name(required(elem, xsd_attrs::NAME)?);
        let id = if complex {
            self.parse_complex_type(ctx, elem, Some(name.clone()))?
        } else {
            self.parse_simple_type(ctx, elem, Some(name.clone()))?
        };
        self.schema.register_type(name, id)
    }

    fn parse_complex_type(&mut self, ctx: &FileContext, elem: &Element, name: Option<QName>) -> Result<TypeId> {
        let mut complex = ComplexType::new(name);
        complex.mixed = parse_bool(elem, xsd_attrs::MIXED)?;
        complex.is_abstract = parse_bool(elem, xsd_attrs::ABSTRACT)?;

        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_tags::ANNOTATION => {}
                xsd_tags::SIMPLE_CONTENT => self.parse_simple_content(ctx, child, &mut complex)?,
                xsd_tags::COMPLEX_CONTENT => self.parse_complex_content(ctx, child, &mut complex)?,
                tag => {
                    if !self.parse_content_item(ctx, child, &mut complex)? {
                        self.unexpected(ctx, child, &format!("complex type (xs:{})", tag))?;
                    }
                }
            }
        }
        Ok(self.schema.add_complex_type(complex))
    }

    /// Parse a model group or attribute child of a complex type or derivation
    fn parse_content_item(&mut self, ctx: &FileContext, child: &Element, complex: &mut ComplexType) -> Result<bool> {
        if let Some(compositor) = Compositor::from_tag(child.local_name()) {
            let group = self.parse_model_group(ctx, child, compositor)?;
            complex.content = ContentType::Elements(group);
            return Ok(true);
        }
        if child.local_name() == xsd_tags::GROUP {
            let particle = self.parse_group_ref(ctx, child)?;
            let mut group = ModelGroup::new(Compositor::Sequence);
            group.particles.push(particle);
            complex.content = ContentType::Elements(group);
            return Ok(true);
        }
        self.parse_attribute_item(
            ctx,
            child,
            &mut complex.attributes,
            &mut complex.attribute_group_refs,
            &mut complex.any_attribute,
        )
    }

    fn derivation_of(
        &mut self,
        ctx: &FileContext,
        content: &Element,
    ) -> Result<Option<(&'static str, QName, Vec<Element>)>> {
        let mut derivations = xsd_children(content).filter(|c| c.local_name() != xsd_tags::ANNOTATION);
        let Some(derivation) = derivations.next() else {
            self.unexpected(ctx, content, "empty content definition")?;
            return Ok(None);
        };
        let method = match derivation.local_name() {
            xsd_tags::EXTENSION => xsd_tags::EXTENSION,
            xsd_tags::RESTRICTION => xsd_tags::RESTRICTION,
            _ => {
                self.unexpected(ctx, derivation, "content definition")?;
                return Ok(None);
            }
        };
        let base = required(derivation, xsd_attrs::BASE).and_then(|b| ctx.resolve_qname(derivation, b));
        let Some(base) = self.attempt(ctx, derivation, base)? else {
            return Ok(None);
        };
        let children = xsd_children(derivation).cloned().collect();
        Ok(Some((method, base, children)))
    }

    fn parse_simple_content(&mut self, ctx: &FileContext, content: &Element, complex: &mut ComplexType) -> Result<()> {
        let Some((method, base, children)) = self.derivation_of(ctx, content)? else {
            return Ok(());
        };

        let mut facets = Facets::default();
        for child in &children {
            if self.parse_content_item(ctx, child, complex)? {
                continue;
            }
            match child.local_name() {
                xsd_tags::ANNOTATION | xsd_tags::SIMPLE_TYPE => {}
                facet if method == xsd_tags::RESTRICTION => self.parse_facet(ctx, child, facet, &mut facets)?,
                _ => self.unexpected(ctx, child, "simple content extension")?,
            }
        }

        complex.content = if method == xsd_tags::RESTRICTION {
            let restricted = self.schema.add_simple_type(SimpleType {
                name: None,
                variety: SimpleVariety::Restriction {
                    base: TypeRef::Named(base.clone()),
                    facets,
                },
            });
            ContentType::Simple(TypeRef::Id(restricted))
        } else {
            ContentType::Simple(TypeRef::Named(base.clone()))
        };
        complex.derivation = Some(Derivation {
            base,
            method: if method == xsd_tags::RESTRICTION {
                DerivationMethod::Restriction
            } else {
                DerivationMethod::Extension
            },
        });
        Ok(())
    }

    fn parse_complex_content(&mut self, ctx: &FileContext, content: &Element, complex: &mut ComplexType) -> Result<()> {
        if content.get_attribute(xsd_attrs::MIXED).is_some() {
            complex.mixed = parse_bool(content, xsd_attrs::MIXED)?;
        }
        let Some((method, base, children)) = self.derivation_of(ctx, content)? else {
            return Ok(());
        };
        for child in &children {
            if !self.parse_content_item(ctx, child, complex)? && child.local_name() != xsd_tags::ANNOTATION {
                self.unexpected(ctx, child, "complex content derivation")?;
            }
        }
        complex.derivation = Some(Derivation {
            base,
            method: if method == xsd_tags::RESTRICTION {
                DerivationMethod::Restriction
            } else {
                DerivationMethod::Extension
            },
        });
        Ok(())
    }

    fn parse_simple_type(&mut self, ctx: &FileContext, elem: &Element, name: Option<QName>) -> Result<TypeId> {
        let mut variety = None;
        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_tags::ANNOTATION => {}
                xsd_tags::RESTRICTION => variety = self.parse_restriction(ctx, child)?,
                xsd_tags::LIST => variety = self.parse_list(ctx, child)?,
                xsd_tags::UNION => variety = self.parse_union(ctx, child)?,
                _ => self.unexpected(ctx, child, "simple type")?,
            }
        }
        let variety = match variety {
            Some(variety) => variety,
            None => {
                self.recover(ctx, elem, ParseError::new("simple type without a definition").into())?;
                SimpleVariety::Restriction {
                    base: TypeRef::Named(QName::xsd(super::builtins::XSD_ANY_SIMPLE_TYPE)),
                    facets: Facets::default(),
                }
            }
        };
        Ok(self.schema.add_simple_type(SimpleType { name, variety }))
    }

    fn parse_restriction(&mut self, ctx: &FileContext, elem: &Element) -> Result<Option<SimpleVariety>> {
        let mut base = match elem.get_attribute(xsd_attrs::BASE) {
            Some(base) => {
                let resolved = ctx.resolve_qname(elem, base);
                self.attempt(ctx, elem, resolved)?.map(TypeRef::Named)
            }
            None => None,
        };
        let mut facets = Facets::default();
        for child in xsd_children(elem) {
            match child.local_name() {
                xsd_tags::ANNOTATION => {}
                xsd_tags::SIMPLE_TYPE => {
                    let id = self.parse_simple_type(ctx, child, None)?;
                    base = Some(TypeRef::Id(id));
                }
                facet => self.parse_facet(ctx, child, facet, &mut facets)?,
            }
        }
        match base {
            Some(base) => Ok(Some(SimpleVariety::Restriction { base, facets })),
            None => {
                self.recover(ctx, elem, ParseError::new("restriction without a base type").into())?;
                Ok(None)
            }
        }
    }

    fn parse_facet(&mut self, ctx: &FileContext, elem: &Element, facet: &str, facets: &mut Facets) -> Result<()> {
        let value = required(elem, xsd_attrs::VALUE).map(str::to_string);
        let Some(value) = self.attempt(ctx, elem, value)? else {
            return Ok(());
        };
        let applied = facets.set(facet, &value);
        match self.attempt(ctx, elem, applied)? {
            Some(false) => self.recover(
                ctx,
                elem,
                ParseError::new(format!("unknown facet 'xs:{}'", facet)).into(),
            ),
            _ => Ok(()),
        }
    }

    fn parse_list(&mut self, ctx: &FileContext, elem: &Element) -> Result<Option<SimpleVariety>> {
        let mut item = match elem.get_attribute(xsd_attrs::ITEM_TYPE) {
            Some(item) => {
                let resolved = ctx.resolve_qname(elem, item);
                self.attempt(ctx, elem, resolved)?.map(TypeRef::Named)
            }
            None => None,
        };
        for child in xsd_children(elem) {
            if child.local_name() == xsd_tags::SIMPLE_TYPE {
                let id = self.parse_simple_type(ctx, child, None)?;
                item = Some(TypeRef::Id(id));
            }
        }
        match item {
            Some(item) => Ok(Some(SimpleVariety::List { item })),
            None => {
                self.recover(ctx, elem, ParseError::new("list without an item type").into())?;
                Ok(None)
            }
        }
    }

    fn parse_union(&mut self, ctx: &FileContext, elem: &Element) -> Result<Option<SimpleVariety>> {
        let mut members = Vec::new();
        if let Some(member_types) = elem.get_attribute(xsd_attrs::MEMBER_TYPES) {
            for member in member_types.split_whitespace() {
                let resolved = ctx.resolve_qname(elem, member);
                if let Some(name) = self.attempt(ctx, elem, resolved)? {
                    members.push(TypeRef::Named(name));
                }
            }
        }
        for child in xsd_children(elem) {
            if child.local_name() == xsd_tags::SIMPLE_TYPE {
                let id = self.parse_simple_type(ctx, child, None)?;
                members.push(TypeRef::Id(id));
            }
        }
        if members.is_empty() {
            self.recover(ctx, elem, ParseError::new("union without member types").into())?;
            return Ok(None);
        }
        Ok(Some(SimpleVariety::Union { members }))
    }

    // Model groups

    fn parse_named_group(&mut self, ctx: &FileContext, elem: &Element) -> Result<()> {
        let name = ctx.global_name(required(elem, xsd_attrs::NAME)?);
        let mut model = None;
        for child in xsd_children(elem) {
            match Compositor::from_tag(child.local_name()) {
                Some(compositor) => model = Some(self.parse_model_group(ctx, child, compositor)?),
                None if child.local_name() == xsd_tags::ANNOTATION => {}
                None => self.unexpected(ctx, child, "group definition")?,
            }
        }
        match model {
            Some(mut group) => {
                // Bounds belong to the referencing particle
                group.occurs = Occurs::once();
                self.schema.register_group(name, group)
            }
            None => self.recover(ctx, elem, ParseError::new(format!("group '{}' has no model", name)).into()),
        }
    }

    fn parse_group_ref(&mut self, ctx: &FileContext, elem: &Element) -> Result<Particle> {
        let name = ctx.resolve_qname(elem, required(elem, xsd_attrs::REF)?)?;
        let occurs = self.occurs(ctx, elem)?;
        Ok(Particle::GroupRef { name, occurs })
    }

    fn parse_model_group(&mut self, ctx: &FileContext, elem: &Element, compositor: Compositor) -> Result<ModelGroup> {
        let mut group = ModelGroup::new(compositor);
        group.occurs = self.occurs(ctx, elem)?;

        for child in xsd_children(elem) {
            let particle = match child.local_name() {
                xsd_tags::ANNOTATION => continue,
                xsd_tags::ELEMENT => self.parse_local_element(ctx, child),
                xsd_tags::GROUP => self.parse_group_ref(ctx, child),
                xsd_tags::ANY => self.parse_wildcard(ctx, child).map(Particle::Any),
                tag => match Compositor::from_tag(tag) {
                    Some(nested) if compositor != Compositor::All => {
                        self.parse_model_group(ctx, child, nested).map(Particle::Group)
                    }
                    _ => Err(ParseError::new(format!("unexpected 'xs:{}' in model group", tag)).into()),
                },
            };
            if let Some(particle) = self.attempt(ctx, child, particle)? {
                group.particles.push(particle);
            }
        }
        Ok(group)
    }

    fn unexpected(&mut self, ctx: &FileContext, elem: &Element, within: &str) -> Result<()> {
        self.recover(
            ctx,
            elem,
            ParseError::new(format!("unexpected 'xs:{}' in {}", elem.local_name(), within)).into(),
        )
    }
}

fn main_root(doc: &Document) -> Result<&Element> {
    let root = doc
        .root()
        .ok_or_else(|| ParseError::new("schema document has no root element"))?;
    if root.local_name() != xsd_tags::SCHEMA || root.namespace() != Some(XSD_NAMESPACE) {
        return Err(ParseError::new(format!(
            "the root element of a schema document must be xs:schema, found '{}'",
            root.lexical_name()
        ))
        .into());
    }
    Ok(root)
}

/// Children in the XSD namespace (foreign elements such as appinfo content are skipped)
fn xsd_children(elem: &Element) -> impl Iterator<Item = &Element> {
    elem.children.iter().filter(|c| c.namespace() == Some(XSD_NAMESPACE))
}

fn required<'e>(elem: &'e Element, attr: &str) -> Result<&'e str> {
    elem.get_attribute(attr).ok_or_else(|| {
        ParseError::new(format!(
            "missing required attribute '{}' on xs:{}",
            attr,
            elem.local_name()
        ))
        .into()
    })
}

fn parse_bool(elem: &Element, attr: &str) -> Result<bool> {
    match elem.get_attribute(attr).map(str::trim) {
        None | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(ParseError::new(format!("wrong boolean value '{}' for '{}'", other, attr)).into()),
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use std::fs;
    use tempfile::TempDir;

    const BOOK_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="book">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="title" type="xs:string"/>
                <xs:element name="author" type="xs:string" maxOccurs="unbounded"/>
                <xs:element name="price" type="priceType" minOccurs="0"/>
            </xs:sequence>
            <xs:attribute name="isbn" type="xs:string" use="required"/>
        </xs:complexType>
    </xs:element>
    <xs:simpleType name="priceType">
        <xs:restriction base="xs:decimal">
            <xs:minInclusive value="0"/>
            <xs:fractionDigits value="2"/>
        </xs:restriction>
    </xs:simpleType>
</xs:schema>"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_book_schema() {
        let schema = XsdSchema::from_string(BOOK_XSD).unwrap();
        let book = schema.element(&QName::local("book")).unwrap();
        assert!(matches!(book.type_ref, Some(TypeRef::Id(TypeId::Complex(_)))));

        let model = schema.element_model(&QName::local("book")).unwrap();
        assert_eq!(model.compositor, Compositor::Sequence);
        assert_eq!(model.particles.len(), 3);
        match &model.particles[1] {
            Particle::Element { decl, occurs } => {
                assert_eq!(decl.name, QName::local("author"));
                assert_eq!(*occurs, Occurs::new(1, None));
            }
            other => panic!("unexpected particle {:?}", other),
        }
        assert!(schema.type_id(&TypeRef::Named(QName::local("priceType"))).is_some());
    }

    #[test]
    fn test_non_schema_root_fails() {
        assert!(XsdSchema::from_string("<root/>").is_err());
        assert!(XsdSchema::from_string("<xs:schema xmlns:xs='urn:not-xsd'/>").is_err());
        assert!(XsdSchema::from_string("").is_err());
    }

    #[test]
    fn test_unprefixed_xs_fallback() {
        let xsd = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema">
            <element name="note" type="xs:string"/>
        </schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        assert_eq!(
            schema.element(&QName::local("note")).unwrap().type_ref,
            Some(TypeRef::Named(QName::xsd("string")))
        );
    }

    #[test]
    fn test_empty_xmlns_clears_default_for_type_names() {
        let xsd = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema"
                xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <simpleType name="code">
                <restriction base="string">
                    <pattern value="[A-Z]+"/>
                </restriction>
            </simpleType>
            <xs:element name="c" type="code" xmlns=""/>
        </schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        assert_eq!(
            schema.element(&QName::local("c")).unwrap().type_ref,
            Some(TypeRef::Named(QName::local("code")))
        );
        assert!(schema.is_valid(&Document::from_string("<c>AB</c>").unwrap()));
        assert!(!schema.is_valid(&Document::from_string("<c>ab</c>").unwrap()));
    }

    #[test]
    fn test_element_form_qualified() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="urn:t" elementFormDefault="qualified">
            <xs:element name="root">
                <xs:complexType>
                    <xs:sequence>
                        <xs:element name="q" type="xs:string"/>
                        <xs:element name="u" type="xs:string" form="unqualified"/>
                    </xs:sequence>
                    <xs:attribute name="a" type="xs:string"/>
                </xs:complexType>
            </xs:element>
        </xs:schema>"#;
        let schema = XsdSchema::from_string(xsd).unwrap();
        let root_name = QName::namespaced("urn:t", "root");
        let model = schema.element_model(&root_name).unwrap();
        assert!(model.find_element(&schema, &QName::namespaced("urn:t", "q")).is_some());
        assert!(model.find_element(&schema, &QName::local("u")).is_some());
    }

    #[test]
    fn test_parse_include() {
        let dir = TempDir::new().unwrap();
        let main = write(
            &dir,
            "main.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:test" xmlns:tns="urn:test" elementFormDefault="qualified">
                <xs:include schemaLocation="types.xsd"/>
                <xs:element name="root" type="tns:personType"/>
            </xs:schema>"#,
        );
        write(
            &dir,
            "types.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:test">
                <xs:complexType name="personType">
                    <xs:sequence><xs:element name="name" type="xs:string"/></xs:sequence>
                </xs:complexType>
            </xs:schema>"#,
        );

        let schema = XsdSchema::from_file(&main).unwrap();
        let person = QName::namespaced("urn:test", "personType");
        assert!(matches!(
            schema.type_id(&TypeRef::Named(person)),
            Some(TypeId::Complex(_))
        ));
    }

    #[test]
    fn test_chameleon_include() {
        let dir = TempDir::new().unwrap();
        let main = write(
            &dir,
            "main.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:test" xmlns:tns="urn:test">
                <xs:include schemaLocation="chameleon.xsd"/>
                <xs:element name="root" type="tns:addressType"/>
            </xs:schema>"#,
        );
        write(
            &dir,
            "chameleon.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="street"><xs:restriction base="xs:string"/></xs:simpleType>
                <xs:complexType name="addressType">
                    <xs:sequence><xs:element name="street" type="street"/></xs:sequence>
                </xs:complexType>
            </xs:schema>"#,
        );

        let schema = XsdSchema::from_file(&main).unwrap();
        assert!(schema
            .type_id(&TypeRef::Named(QName::namespaced("urn:test", "addressType")))
            .is_some());
    }

    #[test]
    fn test_circular_include() {
        let dir = TempDir::new().unwrap();
        let a = write(
            &dir,
            "a.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:c">
                <xs:include schemaLocation="b.xsd"/>
                <xs:simpleType name="A"><xs:restriction base="xs:string"/></xs:simpleType>
            </xs:schema>"#,
        );
        write(
            &dir,
            "b.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:c">
                <xs:include schemaLocation="a.xsd"/>
                <xs:simpleType name="B"><xs:restriction base="xs:int"/></xs:simpleType>
            </xs:schema>"#,
        );

        let schema = XsdSchema::from_file(&a).unwrap();
        assert!(schema.type_id(&TypeRef::Named(QName::namespaced("urn:c", "A"))).is_some());
        assert!(schema.type_id(&TypeRef::Named(QName::namespaced("urn:c", "B"))).is_some());
    }

    #[test]
    fn test_include_depth_limit() {
        let dir = TempDir::new().unwrap();
        for (name, next) in [("a.xsd", "b.xsd"), ("b.xsd", "c.xsd"), ("c.xsd", "d.xsd")] {
            write(
                &dir,
                name,
                &format!(
                    r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                        <xs:include schemaLocation="{}"/>
                    </xs:schema>"#,
                    next
                ),
            );
        }
        write(&dir, "d.xsd", r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#);

        let limits = Limits {
            max_schema_depth: 2,
            ..Limits::default()
        };
        let mut schema =
            XsdSchema::new(ValidationMode::Strict).with_loader(Loader::new().with_limits(limits));
        let err = SchemaParser::new(&mut schema, ValidationMode::Strict)
            .parse_file(&dir.path().join("a.xsd"))
            .unwrap_err();
        assert!(err.to_string().contains("include depth 3 exceeds maximum 2"));

        assert!(XsdSchema::from_file(&dir.path().join("a.xsd")).is_ok());
    }

    #[test]
    fn test_parse_import() {
        let dir = TempDir::new().unwrap();
        let main = write(
            &dir,
            "main.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:other">
                <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
                <xs:import namespace="http://www.w3.org/XML/1998/namespace"
                           schemaLocation="http://www.w3.org/2001/xml.xsd"/>
                <xs:element name="root">
                    <xs:complexType>
                        <xs:sequence><xs:element ref="o:item"/></xs:sequence>
                        <xs:attribute ref="xml:lang"/>
                    </xs:complexType>
                </xs:element>
            </xs:schema>"#,
        );
        write(
            &dir,
            "other.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:other">
                <xs:element name="item" type="xs:int"/>
            </xs:schema>"#,
        );

        let schema = XsdSchema::from_file(&main).unwrap();
        assert!(schema.element(&QName::namespaced("urn:other", "item")).is_some());
    }

    #[test]
    fn test_missing_include_lax_and_strict() {
        let dir = TempDir::new().unwrap();
        let main = write(
            &dir,
            "main.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:include schemaLocation="missing.xsd"/>
                <xs:element name="root" type="xs:string"/>
            </xs:schema>"#,
        );

        assert!(XsdSchema::from_file(&main).is_err());
        let lax = XsdSchema::from_file_with_mode(&main, ValidationMode::Lax).unwrap();
        assert_eq!(lax.build_errors().len(), 1);
        assert!(lax.build_errors()[0].message.contains("missing.xsd"));
    }

    #[test]
    fn test_unknown_facet_lax() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:simpleType name="t">
                <xs:restriction base="xs:string">
                    <xs:explicitTimezone value="optional"/>
                </xs:restriction>
            </xs:simpleType>
        </xs:schema>"#;
        assert!(XsdSchema::from_string(xsd).is_err());
        let lax = XsdSchema::from_string_with_mode(xsd, ValidationMode::Lax).unwrap();
        assert!(lax.build_errors()[0].message.contains("explicitTimezone"));
    }

    #[test]
    fn test_form_default_parse() {
        assert_eq!(FormDefault::parse("qualified"), Some(FormDefault::Qualified));
        assert!(!FormDefault::default().is_qualified());
        assert_eq!(FormDefault::parse("maybe"), None);
    }
}
