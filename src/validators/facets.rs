//! XSD constraining facets
//!
//! This module implements the facets that restrict simple types.

use crate::error::{Error, Result};
use crate::validators::builtins::XsdValue;
use regex::Regex;
use std::cmp::Ordering;

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Parse from the facet's `value` attribute
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::value(format!(
                "Invalid whiteSpace value: '{}'. Must be 'preserve', 'replace', or 'collapse'",
                s
            ))),
        }
    }

    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// A compiled `pattern` facet
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Pattern as written in the schema
    pub source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an XSD regular expression
    pub fn new(source: &str) -> Result<Self> {
        let translated = translate_xsd_regex(source)?;
        let regex = Regex::new(&format!("^(?:{})$", translated))
            .map_err(|e| Error::value(format!("invalid pattern '{}': {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Whether the whole value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

const NAME_START: &str = r"\p{L}_:";
const NAME_CHAR: &str = r"\p{L}\p{N}\p{Mn}\p{Mc}._:\-\u{B7}";

/// Translate XSD regex syntax to the `regex` crate dialect
///
/// XSD patterns are implicitly anchored, treat `^`/`$` as literals and add
/// the `\i`/`\c` name-character escapes.
fn translate_xsd_regex(source: &str) -> Result<String> {
    let mut out = String::with_capacity(source.len() + 8);
    let mut chars = source.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| Error::value(format!("pattern '{}' ends with '\\'", source)))?;
                match (escaped, in_class) {
                    ('i', false) => out.push_str(&format!("[{}]", NAME_START)),
                    ('I', false) => out.push_str(&format!("[^{}]", NAME_START)),
                    ('c', false) => out.push_str(&format!("[{}]", NAME_CHAR)),
                    ('C', false) => out.push_str(&format!("[^{}]", NAME_CHAR)),
                    ('i', true) => out.push_str(NAME_START),
                    ('c', true) => out.push_str(NAME_CHAR),
                    ('I', true) | ('C', true) => {
                        return Err(Error::value(format!(
                            "negated name escape inside a character class is not supported: '{}'",
                            source
                        )))
                    }
                    (other, _) => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '[' if in_class => {
                return Err(Error::value(format!(
                    "character class subtraction is not supported: '{}'",
                    source
                )));
            }
            '[' => {
                in_class = true;
                out.push('[');
                if chars.peek() == Some(&'^') {
                    out.push('^');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '-' if in_class && chars.peek() == Some(&'[') => {
                return Err(Error::value(format!(
                    "character class subtraction is not supported: '{}'",
                    source
                )));
            }
            '^' | '$' if !in_class => {
                out.push('\\');
                out.push(c);
            }
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Facets declared by one restriction step
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// whiteSpace facet
    pub white_space: Option<WhiteSpace>,
    /// length facet
    pub length: Option<usize>,
    /// minLength facet
    pub min_length: Option<usize>,
    /// maxLength facet
    pub max_length: Option<usize>,
    /// pattern facets of this step (any one must match)
    pub patterns: Vec<Pattern>,
    /// enumeration facets (lexical forms)
    pub enumeration: Vec<String>,
    /// minInclusive facet
    pub min_inclusive: Option<String>,
    /// maxInclusive facet
    pub max_inclusive: Option<String>,
    /// minExclusive facet
    pub min_exclusive: Option<String>,
    /// maxExclusive facet
    pub max_exclusive: Option<String>,
    /// totalDigits facet
    pub total_digits: Option<u32>,
    /// fractionDigits facet
    pub fraction_digits: Option<u32>,
}

fn parse_count<T: std::str::FromStr>(facet: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::value(format!("{} must be a non-negative integer, got '{}'", facet, value)))
}

impl Facets {
    /// Set a facet from a schema element; returns `false` for unknown names
    pub fn set(&mut self, name: &str, value: &str) -> Result<bool> {
        match name {
            "whiteSpace" => self.white_space = Some(WhiteSpace::parse(value)?),
            "length" => self.length = Some(parse_count(name, value)?),
            "minLength" => self.min_length = Some(parse_count(name, value)?),
            "maxLength" => self.max_length = Some(parse_count(name, value)?),
            "pattern" => self.patterns.push(Pattern::new(value)?),
            "enumeration" => self.enumeration.push(value.to_string()),
            "minInclusive" => self.min_inclusive = Some(value.to_string()),
            "maxInclusive" => self.max_inclusive = Some(value.to_string()),
            "minExclusive" => self.min_exclusive = Some(value.to_string()),
            "maxExclusive" => self.max_exclusive = Some(value.to_string()),
            "totalDigits" => self.total_digits = Some(parse_count(name, value)?),
            "fractionDigits" => self.fraction_digits = Some(parse_count(name, value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Check a value against these facets
    ///
    /// `lexical` is the whitespace-normalized text, `value` its typed value,
    /// and `parse` decodes facet bounds and enumeration entries with the
    /// base type.
    pub fn validate(
        &self,
        lexical: &str,
        value: &XsdValue,
        parse: &dyn Fn(&str) -> Result<XsdValue>,
    ) -> Result<()> {
        let length = value.facet_length();
        if let Some(expected) = self.length {
            if length != expected {
                return Err(Error::value(format!(
                    "length must be exactly {}, got {}",
                    expected, length
                )));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(Error::value(format!("length must be at least {}, got {}", min, length)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(Error::value(format!("length must be at most {}, got {}", max, length)));
            }
        }

        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(lexical)) {
            let sources: Vec<_> = self.patterns.iter().map(|p| p.source.as_str()).collect();
            return Err(Error::value(format!(
                "value '{}' does not match pattern {}",
                lexical,
                sources.join(" | ")
            )));
        }

        if !self.enumeration.is_empty() {
            let found = self.enumeration.iter().any(|entry| match parse(entry) {
                Ok(allowed) => value.compare(&allowed) == Some(Ordering::Equal),
                Err(_) => entry == lexical,
            });
            if !found {
                return Err(Error::value(format!(
                    "value '{}' is not one of the enumerated values [{}]",
                    lexical,
                    self.enumeration.join(", ")
                )));
            }
        }

        let bounds = [
            (&self.min_inclusive, "minInclusive"),
            (&self.max_inclusive, "maxInclusive"),
            (&self.min_exclusive, "minExclusive"),
            (&self.max_exclusive, "maxExclusive"),
        ];
        for (bound, facet) in bounds {
            let Some(bound) = bound else { continue };
            let limit = parse(bound)?;
            let ordering = value.compare(&limit).ok_or_else(|| {
                Error::value(format!("value '{}' cannot be compared with {} '{}'", lexical, facet, bound))
            })?;
            let ok = match facet {
                "minInclusive" => ordering != Ordering::Less,
                "maxInclusive" => ordering != Ordering::Greater,
                "minExclusive" => ordering == Ordering::Greater,
                _ => ordering == Ordering::Less,
            };
            if !ok {
                return Err(Error::value(format!(
                    "value '{}' violates {} '{}'",
                    lexical, facet, bound
                )));
            }
        }

        if self.total_digits.is_some() || self.fraction_digits.is_some() {
            let (total, fraction) = digit_counts(lexical);
            if let Some(max) = self.total_digits {
                if total > max as usize {
                    return Err(Error::value(format!(
                        "value '{}' has {} digits, totalDigits is {}",
                        lexical, total, max
                    )));
                }
            }
            if let Some(max) = self.fraction_digits {
                if fraction > max as usize {
                    return Err(Error::value(format!(
                        "value '{}' has {} fraction digits, fractionDigits is {}",
                        lexical, fraction, max
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Significant total and fraction digits of a decimal lexical form
fn digit_counts(lexical: &str) -> (usize, usize) {
    let unsigned = lexical.trim_start_matches(['+', '-']);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');
    let total = (int_part.len() + frac_part.len()).max(1);
    (total, frac_part.len())
}
