//! Resource loading utilities
//!
//! This module handles loading of XML schemas and documents from local
//! files or in-memory strings.

use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a resource comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local file path
    Path(PathBuf),
    /// Inline content
    String(String),
}

impl Location {
    /// Directory that relative `schemaLocation` references resolve against
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => path.parent(),
            Location::String(_) => None,
        }
    }

    /// Human-readable name for messages
    pub fn display_name(&self) -> String {
        match self {
            Location::Path(path) => path.display().to_string(),
            Location::String(_) => "<string>".to_string(),
        }
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::Path(path.to_path_buf())
    }
}

/// Resource loader for schemas and documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits applied by this loader
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                log::debug!("loading resource {}", path.display());
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
                })?;

                self.limits.check_xml_size(content.len())?;

                Ok(content)
            }
            Location::String(s) => {
                self.limits.check_xml_size(s.len())?;
                Ok(s.clone())
            }
        }
    }
}

/// Resolve a `schemaLocation` against the directory of the referencing file
pub fn resolve_location(base_dir: Option<&Path>, reference: &str) -> PathBuf {
    let reference = reference.strip_prefix("file://").unwrap_or(reference);
    let candidate = Path::new(reference);
    match base_dir {
        Some(dir) if candidate.is_relative() => dir.join(candidate),
        _ => candidate.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert!(content.contains("<root>test</root>"));
    }

    #[test]
    fn test_load_from_string() {
        let location = Location::String("<root>test</root>".to_string());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert_eq!(content, "<root>test</root>");
    }

    #[test]
    fn test_missing_file_names_path() {
        let location = Location::Path(PathBuf::from("/definitely/not/here.xsd"));
        let err = Loader::new().load(&location).unwrap_err();

        assert!(matches!(err, Error::Resource(_)));
        assert!(err.to_string().contains("/definitely/not/here.xsd"));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load(&location);

        // Strict limits (10 MB max) should reject 11MB file
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_location() {
        let base = Path::new("/schemas/main");
        assert_eq!(
            resolve_location(Some(base), "types.xsd"),
            PathBuf::from("/schemas/main/types.xsd")
        );
        assert_eq!(
            resolve_location(Some(base), "/abs/types.xsd"),
            PathBuf::from("/abs/types.xsd")
        );
        assert_eq!(resolve_location(None, "types.xsd"), PathBuf::from("types.xsd"));
    }
}
