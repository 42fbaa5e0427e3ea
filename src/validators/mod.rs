//! XML Schema validators
//!
//! This module contains the schema model, the schema document parser and
//! the instance validation logic.

// Type system
pub mod builtins;
pub mod facets;
pub mod simple_types;

// Declarations and content models
pub mod attributes;
pub mod complex_types;
pub mod elements;
pub mod groups;
pub mod particles;
pub mod wildcards;

// Schema building and validation
pub mod document_validation;
pub mod parsing;
pub mod schemas;
pub mod validation;

// Re-exports
pub use builtins::XsdValue;
pub use parsing::{FormDefault, SchemaParser};
pub use schemas::{TypeId, TypeRef, XsdSchema};
pub use validation::{ValidationContext, ValidationMode};
