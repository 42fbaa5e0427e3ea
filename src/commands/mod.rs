//! The operations behind the `chk`, `json` and `yaml` subcommands
//!
//! Each operation reports its progress through a [`Reporter`] and returns
//! an [`OperationError`] when it fails. Failures are reported where they
//! happen: a WARNING summary (when the failure kind has one) followed by an
//! ERROR line with the detail.

pub mod chk;
pub mod export;

use std::path::PathBuf;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::reporter::Reporter;

/// Parameters of a validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckParams {
    /// XML Schema file
    pub schema: PathBuf,
    /// XML document to validate
    pub xml: PathBuf,
    /// Verbosity count
    pub verbose: u8,
}

/// Output format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON indented by four spaces
    Json,
    /// YAML keeping the key order of the decoded document
    Yaml,
}

impl ExportFormat {
    /// Serialize a decoded document
    pub fn serialize(&self, value: &JsonValue) -> Result<String, OperationError> {
        match self {
            ExportFormat::Json => {
                let mut buf = Vec::new();
                let formatter = PrettyFormatter::with_indent(b"    ");
                let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value
                    .serialize(&mut serializer)
                    .map_err(|e| OperationError::Serialize(e.to_string()))?;
                String::from_utf8(buf).map_err(|e| OperationError::Serialize(e.to_string()))
            }
            ExportFormat::Yaml => {
                serde_yaml::to_string(value).map_err(|e| OperationError::Serialize(e.to_string()))
            }
        }
    }

    /// Format name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }
}

/// Parameters of a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportParams {
    /// XML Schema file
    pub schema: PathBuf,
    /// XML document to convert
    pub xml: PathBuf,
    /// Target file
    pub output: PathBuf,
    /// Replace an existing target file
    pub overwrite: bool,
    /// Verbosity count
    pub verbose: u8,
    /// Output format
    pub format: ExportFormat,
}

/// Why an operation failed
#[derive(Error, Debug)]
pub enum OperationError {
    /// The schema could not be loaded or built
    #[error("{0}")]
    SchemaLoad(String),

    /// The document does not conform to the schema
    #[error("{0}")]
    Validation(String),

    /// The document could not be decoded
    #[error("{0}")]
    Decode(String),

    /// The decoded document could not be serialized
    #[error("could not serialize the decoded document: {0}")]
    Serialize(String),

    /// The target file exists and overwriting was not requested
    #[error("cannot overwrite {}", .0.display())]
    OutputConflict(PathBuf),

    /// The target file could not be written
    #[error("could not write to file: {}", .path.display())]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl OperationError {
    /// WARNING line printed before the detail, if any
    pub fn summary(&self) -> Option<&'static str> {
        match self {
            OperationError::SchemaLoad(_) => Some("XML Schema load failed."),
            OperationError::Validation(_) | OperationError::Decode(_) => Some("validation failed"),
            OperationError::Serialize(_)
            | OperationError::OutputConflict(_)
            | OperationError::Write { .. } => None,
        }
    }

    /// ERROR line describing the failure
    pub fn detail(&self) -> String {
        self.to_string()
    }

    /// Print the failure
    pub fn report(&self, reporter: &mut Reporter) {
        if let Some(summary) = self.summary() {
            reporter.warning(summary);
        }
        reporter.error(self.detail());
        if let OperationError::Write { source, .. } = self {
            reporter.debug(source.to_string());
        }
    }
}
