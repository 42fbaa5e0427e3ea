//! XSD Wildcards
//!
//! - xs:any - allows any element from specified namespaces
//! - xs:anyAttribute - allows any attribute from specified namespaces

use crate::error::ParseError;
use std::collections::HashSet;

use super::particles::Occurs;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl ProcessContents {
    /// Parse from the `processContents` attribute
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s.trim() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "skip" => Ok(Self::Skip),
            other => Err(ParseError::new(format!(
                "wrong value '{}' in 'processContents' attribute",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces; the empty string stands for no namespace
    Enumeration(HashSet<String>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => {
                let mut namespaces = HashSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(ParseError::new(format!(
                                "wrong value '{}' in 'namespace' attribute",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Check whether a namespace is allowed
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                namespace.is_some() && namespace != target_namespace.as_deref()
            }
            Self::Enumeration(set) => set.contains(namespace.unwrap_or_default()),
        }
    }
}

/// An `xs:any` or `xs:anyAttribute` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    /// Allowed namespaces
    pub namespaces: NamespaceConstraint,
    /// How matched items are validated
    pub process_contents: ProcessContents,
    /// Occurrence bounds (unused for attribute wildcards)
    pub occurs: Occurs,
}

impl Wildcard {
    /// A wildcard accepting anything without validating it
    pub fn lax_any() -> Self {
        Self {
            namespaces: NamespaceConstraint::Any,
            process_contents: ProcessContents::Lax,
            occurs: Occurs::zero_or_more(),
        }
    }

    /// Whether an item in `namespace` matches this wildcard
    pub fn matches(&self, namespace: Option<&str>) -> bool {
        self.namespaces.allows(namespace)
    }
}
