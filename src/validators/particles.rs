//! XSD particle occurrence bounds
//!
//! Particles (elements, groups and wildcards inside a content model) carry
//! `minOccurs` / `maxOccurs` constraints.

use crate::error::{ParseError, Result};

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }
}

/// Parse minOccurs/maxOccurs from XML attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.trim().parse::<u32>().map_err(|_| {
            ParseError::new(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    match max_occurs.map(str::trim) {
        Some("unbounded") => occurs.max = None,
        Some(max_str) => {
            let max = max_str.parse::<u32>().map_err(|_| {
                ParseError::new(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?;
            if occurs.min > max {
                return Err(
                    ParseError::new("maxOccurs must be 'unbounded' or not less than minOccurs")
                        .into(),
                );
            }
            occurs.max = Some(max);
        }
        None if occurs.min > 1 => {
            return Err(ParseError::new("minOccurs must be lesser or equal than maxOccurs").into());
        }
        None => {}
    }

    Ok(occurs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_predicates() {
        assert!(Occurs::optional().is_emptiable());
        assert!(!Occurs::once().is_multiple());
        assert!(Occurs::zero_or_more().is_multiple());
        assert!(Occurs::new(0, Some(3)).is_multiple());
        assert!(Occurs::once().is_missing(0));
        assert!(Occurs::once().is_over(1));
        assert!(!Occurs::zero_or_more().is_over(1000));
    }

    #[test]
    fn test_parse_occurs() {
        assert_eq!(parse_occurs(None, None).unwrap(), Occurs::once());
        assert_eq!(
            parse_occurs(Some("0"), Some("unbounded")).unwrap(),
            Occurs::zero_or_more()
        );
        assert_eq!(parse_occurs(Some("2"), Some("5")).unwrap(), Occurs::new(2, Some(5)));
    }

    #[test]
    fn test_parse_occurs_errors() {
        assert!(parse_occurs(Some("-1"), None).is_err());
        assert!(parse_occurs(Some("3"), Some("2")).is_err());
        assert!(parse_occurs(Some("2"), None).is_err());
        assert!(parse_occurs(None, Some("many")).is_err());
    }
}
