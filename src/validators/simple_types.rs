//! XSD Simple Types
//!
//! This module implements XSD simple type validation including:
//! - Atomic types (built-in and restrictions of them)
//! - List types (whitespace-separated lists)
//! - Union types (value matching any member type)
//!
//! Base and member types are stored as [`TypeRef`]s and resolved through the
//! owning [`XsdSchema`] when a value is decoded.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use crate::validators::builtins::{self, BuiltinType, XsdValue, XSD_ANY_SIMPLE_TYPE, XSD_ID};
use crate::validators::complex_types::ContentType;
use crate::validators::facets::{Facets, WhiteSpace};
use crate::validators::schemas::{TypeId, TypeRef, XsdSchema};

/// Maximum derivation chain followed when decoding
const MAX_DERIVATION_DEPTH: usize = 64;

/// Variety of a simple type
#[derive(Debug, Clone)]
pub enum SimpleVariety {
    /// A built-in atomic or list type
    Builtin(&'static BuiltinType),
    /// Restriction of a base type by facets
    Restriction {
        /// Base type
        base: TypeRef,
        /// Facets declared by this step
        facets: Facets,
    },
    /// Whitespace-separated list of item values
    List {
        /// Item type
        item: TypeRef,
    },
    /// Value of the first member type that accepts it
    Union {
        /// Member types in declaration order
        members: Vec<TypeRef>,
    },
}

/// An `xs:simpleType` definition
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Type name, `None` for anonymous types
    pub name: Option<QName>,
    /// Variety and its parameters
    pub variety: SimpleVariety,
}

impl SimpleType {
    /// Wrap a built-in type
    pub fn builtin(builtin: &'static BuiltinType) -> Self {
        Self {
            name: Some(QName::xsd(builtin.name)),
            variety: SimpleVariety::Builtin(builtin),
        }
    }

    /// Display name for messages
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if name.is_xsd() => format!("xs:{}", name.local_name),
            Some(name) => name.to_string(),
            None => "anonymous simple type".to_string(),
        }
    }

    /// Decode a lexical value into a typed value
    pub fn decode(&self, schema: &XsdSchema, text: &str) -> Result<XsdValue> {
        self.decode_at(schema, text, 0)
    }

    fn decode_at(&self, schema: &XsdSchema, text: &str, depth: usize) -> Result<XsdValue> {
        match &self.variety {
            SimpleVariety::Builtin(builtin) => builtin.decode(text),
            SimpleVariety::Restriction { base, facets } => {
                let base_type = resolve_at(schema, base, depth + 1)?;
                let white_space = match facets.white_space {
                    Some(ws) => ws,
                    None => base_type.white_space_at(schema, depth + 1),
                };
                let lexical = white_space.normalize(text);
                let value = base_type.decode_at(schema, &lexical, depth + 1)?;
                facets
                    .validate(&lexical, &value, &|s: &str| base_type.decode_at(schema, s, depth + 1))
                    .map_err(|e| match e {
                        Error::Value(msg) => {
                            Error::Value(format!("{} for {}", msg, self.display_name()))
                        }
                        other => other,
                    })?;
                Ok(value)
            }
            SimpleVariety::List { item } => {
                let item_type = resolve_at(schema, item, depth + 1)?;
                let items = text
                    .split_whitespace()
                    .map(|token| item_type.decode_at(schema, token, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(XsdValue::List(items))
            }
            SimpleVariety::Union { members } => {
                for member in members {
                    let decoded = resolve_at(schema, member, depth + 1)
                        .and_then(|t| t.decode_at(schema, text, depth + 1));
                    if let Ok(value) = decoded {
                        return Ok(value);
                    }
                }
                Err(Error::value(format!(
                    "'{}' is not a valid value for any member of {}",
                    text.trim(),
                    self.display_name()
                )))
            }
        }
    }

    /// White space handling applied to values of this type
    pub fn white_space(&self, schema: &XsdSchema) -> WhiteSpace {
        self.white_space_at(schema, 0)
    }

    fn white_space_at(&self, schema: &XsdSchema, depth: usize) -> WhiteSpace {
        match &self.variety {
            SimpleVariety::Builtin(builtin) => builtin.white_space,
            SimpleVariety::Restriction { base, facets } => facets.white_space.unwrap_or_else(|| {
                resolve_at(schema, base, depth + 1)
                    .map(|t| t.white_space_at(schema, depth + 1))
                    .unwrap_or(WhiteSpace::Preserve)
            }),
            SimpleVariety::List { .. } | SimpleVariety::Union { .. } => WhiteSpace::Collapse,
        }
    }

    /// The built-in type this type is ultimately restricted from, if atomic
    pub fn builtin_base(&self, schema: &XsdSchema) -> Option<&'static BuiltinType> {
        let mut current = self;
        for depth in 0..MAX_DERIVATION_DEPTH {
            match &current.variety {
                SimpleVariety::Builtin(builtin) => return Some(builtin),
                SimpleVariety::Restriction { base, .. } => {
                    current = resolve_at(schema, base, depth).ok()?;
                }
                _ => return None,
            }
        }
        None
    }

    /// Whether values of this type are `xs:ID`s
    pub fn is_id(&self, schema: &XsdSchema) -> bool {
        self.builtin_base(schema).map_or(false, |b| b.name == XSD_ID)
    }
}

/// Resolve a type reference to the simple type describing its values
///
/// Complex types with simple content resolve to their content type; mixed
/// complex types resolve to `xs:anySimpleType`.
pub fn resolve<'s>(schema: &'s XsdSchema, type_ref: &TypeRef) -> Result<&'s SimpleType> {
    resolve_at(schema, type_ref, 0)
}

fn resolve_at<'s>(schema: &'s XsdSchema, type_ref: &TypeRef, depth: usize) -> Result<&'s SimpleType> {
    if depth > MAX_DERIVATION_DEPTH {
        return Err(Error::value(format!(
            "type derivation of {} is too deep or circular",
            type_ref
        )));
    }
    match schema.type_id(type_ref) {
        Some(TypeId::Simple(id)) => Ok(schema.simple_type(id)),
        Some(TypeId::Complex(id)) => {
            let complex = schema.complex_type(id);
            match &complex.content {
                ContentType::Simple(inner) => resolve_at(schema, inner, depth + 1),
                _ if complex.mixed => any_simple_type(schema),
                _ => Err(Error::value(format!("{} has no simple content", type_ref))),
            }
        }
        None => Err(Error::value(format!("unknown type {}", type_ref))),
    }
}

/// The `xs:anySimpleType` definition registered in every schema
pub fn any_simple_type(schema: &XsdSchema) -> Result<&SimpleType> {
    let any = TypeRef::Named(QName::xsd(XSD_ANY_SIMPLE_TYPE));
    match schema.type_id(&any) {
        Some(TypeId::Simple(id)) => Ok(schema.simple_type(id)),
        _ => Err(Error::value("xs:anySimpleType is not registered")),
    }
}

/// Built-in simple types, in registration order
pub fn builtin_types() -> impl Iterator<Item = SimpleType> {
    builtins::all().map(SimpleType::builtin)
}
