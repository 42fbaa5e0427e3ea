//! Error types for xmltool
//!
//! This module defines the error types raised by the schema library. The
//! command layer has its own taxonomy in [`crate::commands::OperationError`].

use std::fmt;
use thiserror::Error;

/// Result type alias using xmltool Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema and document operations
#[derive(Error, Debug)]
pub enum Error {
    /// Instance document does not conform to the schema
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Schema document could not be built
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid lexical value for a type or facet
    #[error("value error: {0}")]
    Value(String),

    /// A document could not be decoded
    #[error("decoding error: {0}")]
    Decode(String),

    /// A file could not be read
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// XML well-formedness error
    #[error("XML error: {0}")]
    Xml(String),
}

impl Error {
    /// Shorthand for a value error
    pub fn value(message: impl Into<String>) -> Self {
        Error::Value(message.into())
    }
}

/// An instance document defect, located by element path
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Path to the element that failed validation
    pub path: Option<String>,
    /// Underlying reason
    pub reason: Option<String>,
    /// Source line of the offending element
    pub line: Option<usize>,
}

impl ValidationError {
    /// Error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            reason: None,
            line: None,
        }
    }

    /// Attach the element path, e.g. `/library/book[2]`
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the source line
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref reason) = self.reason {
            write!(f, "\n\nReason: {}", reason)?;
        }

        if let Some(ref path) = self.path {
            write!(f, "\n\nPath: {}", path)?;
            if let Some(line) = self.line {
                write!(f, " (line {})", line)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// XML Schema parsing error
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema set (file, component)
    pub location: Option<String>,
}

impl ParseError {
    /// Error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
