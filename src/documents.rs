//! XML document handling
//!
//! Parses XML text into a small element tree with resolved names. Both
//! schema documents and instance documents go through this tree.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::{Loader, Location};
use crate::namespaces::{NamespaceContext, QName};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::path::Path;

/// An attribute of an element
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Resolved attribute name (unprefixed attributes have no namespace)
    pub qname: QName,
    /// Name as written in the source (`xsi:nil`)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Prefix used in the source, if any
    pub prefix: Option<String>,
    /// Attributes in document order, xmlns declarations excluded
    pub attributes: Vec<Attribute>,
    /// Character data directly inside this element (text and CDATA)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    pub namespaces: NamespaceContext,
    /// 1-based line of the start tag
    pub line: usize,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
            line: 1,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Name as written in the source (`prefix:local` or `local`)
    pub fn lexical_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.qname.local_name),
            None => self.qname.local_name.clone(),
        }
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qname.namespace.is_none() && a.qname.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.qname == qname)
            .map(|a| a.value.as_str())
    }

    /// Text content, if any non-whitespace character data is present
    pub fn significant_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data
    pub fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
    /// Where the document was read from
    pub location: Location,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        let mut doc = Self::parse(xml, &Limits::default())?;
        doc.location = Location::String(String::new());
        Ok(doc)
    }

    /// Read and parse an XML document from a file
    pub fn from_file(path: &Path, loader: &Loader) -> Result<Self> {
        let location = Location::from(path);
        let content = loader.load(&location)?;
        let mut doc = Self::parse(&content, loader.limits()).map_err(|e| match e {
            Error::Xml(msg) => Error::Xml(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        doc.location = location;
        Ok(doc)
    }

    /// Parse XML text with the given limits
    pub fn parse(xml: &str, limits: &Limits) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.trim_text(false);
        reader.expand_empty_elements(true);

        let mut root = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut line = 1usize;
        let mut scanned = 0usize;

        loop {
            let position = reader.buffer_position();
            line += count_newlines(xml, scanned, position);
            scanned = position;

            let (resolved, event) = match reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        position, e
                    )))
                }
            };
            let namespace = namespace_of(resolved, "element")?;

            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(Error::Xml(format!(
                            "Junk after document element at line {}",
                            line
                        )));
                    }
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let mut element = Self::parse_element(&reader, namespace, &start)?;
                    element.line = line;
                    element_stack.push(element);
                }
                Event::End(_) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            root = Some(current);
                        }
                    }
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    match element_stack.last_mut() {
                        Some(current) => current.push_text(&text),
                        None if !text.trim().is_empty() => {
                            return Err(Error::Xml(format!(
                                "Character data outside of the root element at line {}",
                                line
                            )));
                        }
                        None => {}
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = element_stack.last_mut() {
                        let bytes = data.into_inner();
                        current.push_text(&String::from_utf8_lossy(&bytes));
                    }
                }
                Event::Eof => break,
                _ => {} // Declarations, comments, processing instructions, doctype
            }
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml(format!(
                "Unexpected end of document: unclosed element '{}'",
                element_stack
                    .last()
                    .map(|e| e.lexical_name())
                    .unwrap_or_default()
            )));
        }

        if root.is_none() {
            return Err(Error::Xml("Document has no root element".to_string()));
        }

        Ok(Self {
            root,
            location: Location::String(String::new()),
        })
    }

    /// Build an element from a start tag
    fn parse_element(
        reader: &NsReader<&[u8]>,
        namespace: Option<String>,
        start: &BytesStart,
    ) -> Result<Element> {
        let local = utf8(start.local_name().as_ref(), "element name")?;
        let mut element = Element::new(QName::new(namespace, local));
        element.prefix = match start.name().prefix() {
            Some(prefix) => Some(utf8(prefix.as_ref(), "element prefix")?),
            None => None,
        };

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let raw_name = utf8(attr.key.as_ref(), "attribute name")?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if raw_name == "xmlns" {
                element.namespaces.set_default_namespace(value);
                continue;
            }
            if let Some(prefix) = raw_name.strip_prefix("xmlns:") {
                element.namespaces.add_prefix(prefix, value);
                continue;
            }

            let (attr_resolved, attr_local) = reader.resolve_attribute(attr.key);
            let attr_local = utf8(attr_local.as_ref(), "attribute name")?;
            let attr_namespace = namespace_of(attr_resolved, "attribute")?;
            element.attributes.push(Attribute {
                qname: QName::new(attr_namespace, attr_local),
                name: raw_name,
                value,
            });
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::Xml(format!("Invalid {}: {}", what, e)))
}

fn namespace_of(resolved: ResolveResult, what: &str) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(utf8(ns.as_ref(), "namespace")?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::Xml(format!(
            "Unbound prefix '{}' on {}",
            String::from_utf8_lossy(&prefix),
            what
        ))),
    }
}

fn count_newlines(xml: &str, from: usize, to: usize) -> usize {
    xml.as_bytes()
        .get(from..to)
        .map(|slice| slice.iter().filter(|&&b| b == b'\n').count())
        .unwrap_or(0)
}
