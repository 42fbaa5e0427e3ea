//! # xmltool
//!
//! Validate XML documents against an XML Schema (XSD 1.0) and convert them
//! to JSON or YAML.
//!
//! The library side holds a compact XSD engine: schema loading with
//! `include` and `import`, validation with collected errors, and a
//! schema-aware decoder producing ordered JSON values. The `xmltool` binary
//! wraps it in three subcommands, `chk`, `json` and `yaml`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use xmltool::{ValidationMode, XsdSchema};
//!
//! let schema = XsdSchema::from_file(Path::new("library.xsd"))?;
//! for error in schema.iter_errors_file(Path::new("library.xml"))? {
//!     println!("{}", error);
//! }
//!
//! let (value, _) = schema.decode_file(Path::new("library.xml"), ValidationMode::Lax)?;
//! println!("{}", serde_json::to_string_pretty(&value)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and documents
pub mod namespaces;
pub mod loaders;
pub mod documents;

// Schema engine
pub mod validators;

// Data conversion
pub mod converters;

// Command line operations
pub mod reporter;
pub mod commands;

pub use error::{Error, Result};
pub use validators::{ValidationMode, XsdSchema};

/// Version of the xmltool crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
