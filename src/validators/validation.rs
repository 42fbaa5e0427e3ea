//! XML Validation Infrastructure
//!
//! This module provides the validation mode and the context that carries
//! state (collected errors, seen IDs, element path) while an instance
//! document is walked.

use std::collections::HashMap;

use crate::error::{Error, Result, ValidationError};

/// Validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Strict validation - the first error is fatal
    #[default]
    Strict,
    /// Lax validation - errors are collected and processing continues
    Lax,
    /// Skip validation - no validation is performed
    Skip,
}

impl ValidationMode {
    /// Parse validation mode from string
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            "skip" => Ok(ValidationMode::Skip),
            _ => Err(Error::Value(format!(
                "Invalid validation mode: '{}'. Must be 'strict', 'lax', or 'skip'",
                s
            ))),
        }
    }

    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
            ValidationMode::Skip => "skip",
        }
    }
}

/// Validation context for handling the validation process
#[derive(Debug)]
pub struct ValidationContext {
    /// Current validation mode
    pub mode: ValidationMode,
    /// Collected validation errors
    pub errors: Vec<ValidationError>,
    /// ID values seen so far, with the path that declared them
    pub id_map: HashMap<String, String>,
    /// Path segments of the element being validated
    path: Vec<String>,
    /// Source line of the element being validated
    line: Option<usize>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(ValidationMode::Strict)
    }
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
            id_map: HashMap::new(),
            path: Vec::new(),
            line: None,
        }
    }

    /// Enter a child element; `index` is its 1-based position among same-named siblings
    pub fn enter(&mut self, name: &str, index: Option<usize>, line: usize) {
        let segment = match index {
            Some(index) => format!("{}[{}]", name, index),
            None => name.to_string(),
        };
        self.path.push(segment);
        self.line = Some(line);
    }

    /// Leave the current element
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Path of the current element, e.g. `/catalog/book[2]`
    pub fn current_path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Raise or collect an error based on validation mode
    pub fn raise_or_collect(&mut self, error: ValidationError) -> Result<()> {
        match self.mode {
            ValidationMode::Strict => Err(Error::Validation(error)),
            ValidationMode::Lax => {
                log::trace!("lax validation keeps going after: {}", error.message);
                self.errors.push(error);
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }

    /// Create a validation error at the current element and handle it according to mode
    pub fn validation_error(
        &mut self,
        message: impl Into<String>,
        reason: Option<String>,
    ) -> Result<()> {
        let mut error = ValidationError::new(message).with_path(self.current_path());
        if let Some(reason) = reason {
            error = error.with_reason(reason);
        }
        if let Some(line) = self.line {
            error = error.with_line(line);
        }
        self.raise_or_collect(error)
    }

    /// Register an ID value
    pub fn register_id(&mut self, id: &str) -> Result<()> {
        let path = self.current_path();
        match self.id_map.get(id) {
            Some(first) => {
                let reason = format!("value already used at {}", first);
                self.validation_error(format!("Duplicate ID value: '{}'", id), Some(reason))
            }
            None => {
                self.id_map.insert(id.to_string(), path);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(ValidationMode::parse("lax").unwrap(), ValidationMode::Lax);
        assert_eq!(ValidationMode::Skip.as_str(), "skip");
        assert!(ValidationMode::parse("loose").is_err());
    }

    #[test]
    fn test_strict_raises() {
        let mut ctx = ValidationContext::new(ValidationMode::Strict);
        ctx.enter("root", None, 1);
        let err = ctx.validation_error("bad", None).unwrap_err();
        match err {
            Error::Validation(e) => assert_eq!(e.path.as_deref(), Some("/root")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lax_collects() {
        let mut ctx = ValidationContext::new(ValidationMode::Lax);
        ctx.enter("root", None, 1);
        ctx.enter("item", Some(2), 3);
        ctx.validation_error("bad", Some("because".to_string())).unwrap();
        ctx.exit();

        assert!(ctx.has_errors());
        assert_eq!(ctx.errors[0].path.as_deref(), Some("/root/item[2]"));
        assert_eq!(ctx.errors[0].line, Some(3));
        assert_eq!(ctx.current_path(), "/root");
    }

    #[test]
    fn test_skip_ignores() {
        let mut ctx = ValidationContext::new(ValidationMode::Skip);
        ctx.validation_error("bad", None).unwrap();
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut ctx = ValidationContext::new(ValidationMode::Lax);
        ctx.enter("a", None, 1);
        ctx.register_id("x1").unwrap();
        ctx.register_id("x2").unwrap();
        ctx.register_id("x1").unwrap();
        assert_eq!(ctx.errors.len(), 1);
        assert!(ctx.errors[0].message.contains("x1"));
    }
}
