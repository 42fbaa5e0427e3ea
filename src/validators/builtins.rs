//! XSD built-in types
//!
//! Lexical checks and typed values for the built-in primitive and derived
//! datatypes of XML Schema 1.0.

use crate::error::{Error, Result};
use crate::validators::facets::WhiteSpace;
use base64::Engine;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// XSD anyType type name
pub const XSD_ANY_TYPE: &str = "anyType";
/// XSD anySimpleType type name
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";
/// XSD ID type name
pub const XSD_ID: &str = "ID";

/// Represents any XSD atomic or list value
#[derive(Debug, Clone, PartialEq)]
pub enum XsdValue {
    /// String-like value (strings, names, URIs, dates, durations, QNames)
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Decimal value, as its collapsed lexical form
    Decimal(String),
    /// Integer value (xs:integer and its derivations)
    Integer(i128),
    /// Integer beyond the `i128` range, as its lexical form without a `+` sign
    BigInteger(String),
    /// Float or double value
    Double(f64),
    /// Binary value: lexical form and decoded length in octets
    Binary(String, usize),
    /// List of item values
    List(Vec<XsdValue>),
}

impl XsdValue {
    /// Length as measured by the length facets
    pub fn facet_length(&self) -> usize {
        match self {
            XsdValue::Binary(_, octets) => *octets,
            XsdValue::List(items) => items.len(),
            other => other.to_string().chars().count(),
        }
    }

    /// Value-space comparison, when the two values are comparable
    pub fn compare(&self, other: &XsdValue) -> Option<Ordering> {
        match (self, other) {
            (XsdValue::Integer(a), XsdValue::Integer(b)) => Some(a.cmp(b)),
            (XsdValue::Double(a), XsdValue::Double(b)) => a.partial_cmp(b),
            (XsdValue::Double(a), b) | (b, XsdValue::Double(a)) if b.as_decimal().is_some() => {
                let b = b.as_decimal().and_then(|d| f64::from_str(&d).ok())?;
                let ordering = a.partial_cmp(&b)?;
                if matches!(self, XsdValue::Double(_)) {
                    Some(ordering)
                } else {
                    Some(ordering.reverse())
                }
            }
            (a, b) if a.as_decimal().is_some() && b.as_decimal().is_some() => {
                Some(compare_decimals(&a.as_decimal()?, &b.as_decimal()?))
            }
            (XsdValue::String(a), XsdValue::String(b)) => Some(a.cmp(b)),
            (XsdValue::Boolean(a), XsdValue::Boolean(b)) => Some(a.cmp(b)),
            (XsdValue::Binary(a, _), XsdValue::Binary(b, _)) => {
                Some(a.to_ascii_uppercase().cmp(&b.to_ascii_uppercase()))
            }
            (XsdValue::List(a), XsdValue::List(b)) => {
                if a.len() != b.len() {
                    return None;
                }
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        _ => return None,
                    }
                }
                Some(Ordering::Equal)
            }
            _ => None,
        }
    }

    /// Lexical decimal form of a numeric value
    fn as_decimal(&self) -> Option<String> {
        match self {
            XsdValue::Decimal(lexical) | XsdValue::BigInteger(lexical) => Some(lexical.clone()),
            XsdValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// JSON representation used by the decoded mapping
    ///
    /// Decimals are kept as text so no precision is lost.
    pub fn to_json(&self) -> JsonValue {
        match self {
            XsdValue::String(s) | XsdValue::Binary(s, _) => JsonValue::String(s.clone()),
            XsdValue::Boolean(b) => JsonValue::Bool(*b),
            XsdValue::Decimal(lexical) | XsdValue::BigInteger(lexical) => {
                JsonValue::String(lexical.clone())
            }
            XsdValue::Integer(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    JsonValue::from(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    JsonValue::from(v)
                } else {
                    JsonValue::String(i.to_string())
                }
            }
            XsdValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(self.to_string())),
            XsdValue::List(items) => JsonValue::Array(items.iter().map(|v| v.to_json()).collect()),
        }
    }
}

impl fmt::Display for XsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XsdValue::String(s)
            | XsdValue::Binary(s, _)
            | XsdValue::Decimal(s)
            | XsdValue::BigInteger(s) => write!(f, "{}", s),
            XsdValue::Boolean(b) => write!(f, "{}", b),
            XsdValue::Integer(i) => write!(f, "{}", i),
            XsdValue::Double(v) => {
                if v.is_nan() {
                    write!(f, "NaN")
                } else if *v == f64::INFINITY {
                    write!(f, "INF")
                } else if *v == f64::NEG_INFINITY {
                    write!(f, "-INF")
                } else {
                    write!(f, "{}", v)
                }
            }
            XsdValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Definition of a built-in XSD type
#[derive(Debug)]
pub struct BuiltinType {
    /// Type name (local name in the XSD namespace)
    pub name: &'static str,
    /// White space handling applied before the lexical check
    pub white_space: WhiteSpace,
    /// Validator function on the normalized lexical form
    validator: fn(&str) -> Result<XsdValue>,
}

impl BuiltinType {
    /// Normalize and validate a lexical value against this type
    pub fn decode(&self, value: &str) -> Result<XsdValue> {
        let normalized = self.white_space.normalize(value);
        (self.validator)(&normalized).map_err(|e| match e {
            Error::Value(msg) => Error::Value(format!(
                "'{}' is not a valid value for xs:{}: {}",
                normalized, self.name, msg
            )),
            other => other,
        })
    }

    /// Whether values of this type are list values
    pub fn is_list(&self) -> bool {
        matches!(self.name, "IDREFS" | "ENTITIES" | "NMTOKENS")
    }
}

macro_rules! builtin {
    ($name:expr, $ws:ident, $validator:expr) => {
        BuiltinType {
            name: $name,
            white_space: WhiteSpace::$ws,
            validator: $validator,
        }
    };
}

static BUILTINS: Lazy<Vec<BuiltinType>> = Lazy::new(|| {
    vec![
        builtin!(XSD_ANY_SIMPLE_TYPE, Preserve, string_value),
        builtin!("string", Preserve, string_value),
        builtin!("normalizedString", Replace, string_value),
        builtin!("token", Collapse, string_value),
        builtin!("language", Collapse, validate_language),
        builtin!("Name", Collapse, validate_name),
        builtin!("NCName", Collapse, validate_ncname),
        builtin!(XSD_ID, Collapse, validate_ncname),
        builtin!("IDREF", Collapse, validate_ncname),
        builtin!("ENTITY", Collapse, validate_ncname),
        builtin!("NMTOKEN", Collapse, validate_nmtoken),
        builtin!("IDREFS", Collapse, |v: &str| list_of(v, validate_ncname)),
        builtin!("ENTITIES", Collapse, |v: &str| list_of(v, validate_ncname)),
        builtin!("NMTOKENS", Collapse, |v: &str| list_of(v, validate_nmtoken)),
        builtin!("boolean", Collapse, validate_boolean),
        builtin!("decimal", Collapse, validate_decimal),
        builtin!("integer", Collapse, |v: &str| integer_in(v, None, None)),
        builtin!("long", Collapse, |v: &str| integer_in(v, Some(i64::MIN as i128), Some(i64::MAX as i128))),
        builtin!("int", Collapse, |v: &str| integer_in(v, Some(i32::MIN as i128), Some(i32::MAX as i128))),
        builtin!("short", Collapse, |v: &str| integer_in(v, Some(i16::MIN as i128), Some(i16::MAX as i128))),
        builtin!("byte", Collapse, |v: &str| integer_in(v, Some(i8::MIN as i128), Some(i8::MAX as i128))),
        builtin!("nonNegativeInteger", Collapse, |v: &str| integer_in(v, Some(0), None)),
        builtin!("positiveInteger", Collapse, |v: &str| integer_in(v, Some(1), None)),
        builtin!("nonPositiveInteger", Collapse, |v: &str| integer_in(v, None, Some(0))),
        builtin!("negativeInteger", Collapse, |v: &str| integer_in(v, None, Some(-1))),
        builtin!("unsignedLong", Collapse, |v: &str| integer_in(v, Some(0), Some(u64::MAX as i128))),
        builtin!("unsignedInt", Collapse, |v: &str| integer_in(v, Some(0), Some(u32::MAX as i128))),
        builtin!("unsignedShort", Collapse, |v: &str| integer_in(v, Some(0), Some(u16::MAX as i128))),
        builtin!("unsignedByte", Collapse, |v: &str| integer_in(v, Some(0), Some(u8::MAX as i128))),
        builtin!("float", Collapse, validate_double),
        builtin!("double", Collapse, validate_double),
        builtin!("duration", Collapse, validate_duration),
        builtin!("dateTime", Collapse, validate_datetime),
        builtin!("date", Collapse, validate_date),
        builtin!("time", Collapse, validate_time),
        builtin!("gYearMonth", Collapse, |v: &str| lexical(v, &G_YEAR_MONTH, "gYearMonth")),
        builtin!("gYear", Collapse, |v: &str| lexical(v, &G_YEAR, "gYear")),
        builtin!("gMonthDay", Collapse, |v: &str| lexical(v, &G_MONTH_DAY, "gMonthDay")),
        builtin!("gDay", Collapse, |v: &str| lexical(v, &G_DAY, "gDay")),
        builtin!("gMonth", Collapse, |v: &str| lexical(v, &G_MONTH, "gMonth")),
        builtin!("hexBinary", Collapse, validate_hex_binary),
        builtin!("base64Binary", Collapse, validate_base64_binary),
        builtin!("anyURI", Collapse, validate_any_uri),
        builtin!("QName", Collapse, validate_qname),
        builtin!("NOTATION", Collapse, validate_qname),
    ]
});

static BUILTIN_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    BUILTINS
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name, i))
        .collect()
});

/// Look up a built-in simple type by local name
pub fn lookup(name: &str) -> Option<&'static BuiltinType> {
    BUILTIN_INDEX.get(name).map(|&i| &BUILTINS[i])
}

/// All built-in simple types
pub fn all() -> impl Iterator<Item = &'static BuiltinType> {
    BUILTINS.iter()
}

static LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").expect("valid regex"));
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_:][\p{L}\p{N}\p{Mn}\p{Mc}._:\-\u{B7}]*$").expect("valid regex")
});
static NMTOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}\p{Mn}\p{Mc}._:\-\u{B7}]+$").expect("valid regex"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid regex"));
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static DOUBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|[+-]?INF|NaN)$").expect("valid regex")
});
static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").expect("valid regex")
});
static TIMEZONE: &str = r"(Z|[+-]((0\d|1[0-3]):[0-5]\d|14:00))?";
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}}){}$", TIMEZONE)).expect("valid regex")
});
static DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}})T(([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?|24:00:00(\.0+)?){}$",
        TIMEZONE
    ))
    .expect("valid regex")
});
static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?|24:00:00(\.0+)?){}$",
        TIMEZONE
    ))
    .expect("valid regex")
});
static G_YEAR_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^-?\d{{4,}}-(0[1-9]|1[0-2]){}$", TIMEZONE)).expect("valid regex")
});
static G_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^-?\d{{4,}}{}$", TIMEZONE)).expect("valid regex"));
static G_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01]){}$", TIMEZONE))
        .expect("valid regex")
});
static G_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^---(0[1-9]|[12]\d|3[01]){}$", TIMEZONE)).expect("valid regex")
});
static G_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^--(0[1-9]|1[0-2]){}$", TIMEZONE)).expect("valid regex")
});

fn string_value(value: &str) -> Result<XsdValue> {
    Ok(XsdValue::String(value.to_string()))
}

fn lexical(value: &str, re: &Regex, what: &str) -> Result<XsdValue> {
    if re.is_match(value) {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(Error::value(format!("invalid {} format", what)))
    }
}

fn validate_language(value: &str) -> Result<XsdValue> {
    lexical(value, &LANGUAGE, "language code")
}

fn validate_name(value: &str) -> Result<XsdValue> {
    lexical(value, &NAME, "Name")
}

fn validate_ncname(value: &str) -> Result<XsdValue> {
    if value.contains(':') {
        return Err(Error::value("NCName cannot contain colons"));
    }
    lexical(value, &NAME, "NCName")
}

fn validate_nmtoken(value: &str) -> Result<XsdValue> {
    lexical(value, &NMTOKEN, "NMTOKEN")
}

fn list_of(value: &str, item: fn(&str) -> Result<XsdValue>) -> Result<XsdValue> {
    let items = value
        .split_whitespace()
        .map(item)
        .collect::<Result<Vec<_>>>()?;
    if items.is_empty() {
        return Err(Error::value("list must have at least one item"));
    }
    Ok(XsdValue::List(items))
}

fn validate_boolean(value: &str) -> Result<XsdValue> {
    match value {
        "true" | "1" => Ok(XsdValue::Boolean(true)),
        "false" | "0" => Ok(XsdValue::Boolean(false)),
        _ => Err(Error::value("boolean must be one of true, false, 1, 0")),
    }
}

fn validate_decimal(value: &str) -> Result<XsdValue> {
    if !DECIMAL.is_match(value) {
        return Err(Error::value("invalid decimal format"));
    }
    Ok(XsdValue::Decimal(value.to_string()))
}

/// Order of two decimal lexical forms
///
/// Values short enough for a [`Decimal`] are compared as such, longer ones
/// digit by digit.
pub(crate) fn compare_decimals(a: &str, b: &str) -> Ordering {
    let (a_negative, a_int, a_frac) = decimal_parts(a);
    let (b_negative, b_int, b_frac) = decimal_parts(b);

    let exact = |negative: bool, int: &str, frac: &str| {
        if int.len() + frac.len() > MAX_DECIMAL_DIGITS {
            return None;
        }
        let sign = if negative { "-" } else { "" };
        let int = if int.is_empty() { "0" } else { int };
        let lexical = if frac.is_empty() {
            format!("{}{}", sign, int)
        } else {
            format!("{}{}.{}", sign, int, frac)
        };
        Decimal::from_str(&lexical).ok()
    };
    if let (Some(x), Some(y)) = (exact(a_negative, a_int, a_frac), exact(b_negative, b_int, b_frac)) {
        return x.cmp(&y);
    }

    let sign = |negative: bool, int: &str, frac: &str| match (int.is_empty() && frac.is_empty(), negative) {
        (true, _) => 0,
        (false, true) => -1,
        (false, false) => 1,
    };
    let a_sign = sign(a_negative, a_int, a_frac);
    let b_sign = sign(b_negative, b_int, b_frac);
    if a_sign != b_sign {
        return a_sign.cmp(&b_sign);
    }

    let magnitude = a_int
        .len()
        .cmp(&b_int.len())
        .then_with(|| a_int.cmp(b_int))
        .then_with(|| a_frac.cmp(b_frac));
    if a_sign < 0 {
        magnitude.reverse()
    } else {
        magnitude
    }
}

/// Significant digits a [`Decimal`] holds without rounding
const MAX_DECIMAL_DIGITS: usize = 28;

/// Sign, integer digits without leading zeros and fraction digits without
/// trailing zeros
fn decimal_parts(lexical: &str) -> (bool, &str, &str) {
    let negative = lexical.starts_with('-');
    let unsigned = lexical.trim_start_matches(['+', '-']);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    (
        negative,
        int_part.trim_start_matches('0'),
        frac_part.trim_end_matches('0'),
    )
}

fn integer_in(value: &str, min: Option<i128>, max: Option<i128>) -> Result<XsdValue> {
    if !INTEGER.is_match(value) {
        return Err(Error::value("invalid integer format"));
    }
    let digits = value.strip_prefix('+').unwrap_or(value);
    let Ok(parsed) = digits.parse::<i128>() else {
        // Beyond i128: only the unbounded side of a type accepts it
        if digits.starts_with('-') {
            if let Some(min) = min {
                return Err(Error::value(format!("value must be at least {}", min)));
            }
        } else if let Some(max) = max {
            return Err(Error::value(format!("value must be at most {}", max)));
        }
        return Ok(XsdValue::BigInteger(digits.to_string()));
    };
    if let Some(min) = min {
        if parsed < min {
            return Err(Error::value(format!("value must be at least {}", min)));
        }
    }
    if let Some(max) = max {
        if parsed > max {
            return Err(Error::value(format!("value must be at most {}", max)));
        }
    }
    Ok(XsdValue::Integer(parsed))
}

fn validate_double(value: &str) -> Result<XsdValue> {
    if !DOUBLE.is_match(value) {
        return Err(Error::value("invalid floating point format"));
    }
    let parsed = match value {
        "INF" | "+INF" => f64::INFINITY,
        "-INF" => f64::NEG_INFINITY,
        "NaN" => f64::NAN,
        other => other
            .parse::<f64>()
            .map_err(|e| Error::value(e.to_string()))?,
    };
    Ok(XsdValue::Double(parsed))
}

fn validate_duration(value: &str) -> Result<XsdValue> {
    if value.ends_with('P') || value.ends_with('T') {
        return Err(Error::value("duration must have at least one component"));
    }
    lexical(value, &DURATION, "duration")
}

fn check_calendar_date(year: &str, month: &str, day: &str) -> Result<()> {
    let year: i32 = year
        .parse()
        .map_err(|_| Error::value("year out of supported range"))?;
    let month: u32 = month.parse().map_err(|_| Error::value("invalid month"))?;
    let day: u32 = day.parse().map_err(|_| Error::value("invalid day"))?;
    if year == 0 {
        return Err(Error::value("year 0000 is not allowed"));
    }
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|_| ())
        .ok_or_else(|| Error::value(format!("{:02}-{:02} is not a valid day of year {}", month, day, year)))
}

fn validate_date(value: &str) -> Result<XsdValue> {
    let caps = DATE
        .captures(value)
        .ok_or_else(|| Error::value("invalid date format"))?;
    check_calendar_date(&caps[1], &caps[2], &caps[3])?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_datetime(value: &str) -> Result<XsdValue> {
    let caps = DATETIME
        .captures(value)
        .ok_or_else(|| Error::value("invalid dateTime format"))?;
    check_calendar_date(&caps[1], &caps[2], &caps[3])?;
    Ok(XsdValue::String(value.to_string()))
}

fn validate_time(value: &str) -> Result<XsdValue> {
    lexical(value, &TIME, "time")
}

fn validate_hex_binary(value: &str) -> Result<XsdValue> {
    if value.len() % 2 != 0 {
        return Err(Error::value("hexBinary must have an even number of digits"));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::value("hexBinary contains a non-hexadecimal digit"));
    }
    Ok(XsdValue::Binary(value.to_string(), value.len() / 2))
}

fn validate_base64_binary(value: &str) -> Result<XsdValue> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::value(format!("invalid base64 content: {}", e)))?;
    Ok(XsdValue::Binary(value.to_string(), bytes.len()))
}

fn validate_any_uri(value: &str) -> Result<XsdValue> {
    if value.contains(['\n', '\r', '\t']) {
        return Err(Error::value("anyURI cannot contain newline or tab characters"));
    }
    if value.matches('#').count() > 1 {
        return Err(Error::value("anyURI cannot contain more than one fragment"));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_qname(value: &str) -> Result<XsdValue> {
    match value.split_once(':') {
        Some((prefix, local)) => {
            validate_ncname(prefix)?;
            validate_ncname(local)?;
        }
        None => {
            validate_ncname(value)?;
        }
    }
    Ok(XsdValue::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(name: &str, value: &str) -> Result<XsdValue> {
        lookup(name).expect("builtin exists").decode(value)
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("string").is_some());
        assert!(lookup("unsignedShort").is_some());
        assert!(lookup("nope").is_none());
        assert!(lookup("NMTOKENS").unwrap().is_list());
    }

    #[test]
    fn test_whitespace_applied_before_check() {
        assert_eq!(
            decode("token", "  a \n b  ").unwrap(),
            XsdValue::String("a b".into())
        );
        assert_eq!(
            decode("string", "  a  ").unwrap(),
            XsdValue::String("  a  ".into())
        );
        assert_eq!(decode("int", " 42 ").unwrap(), XsdValue::Integer(42));
    }

    #[test]
    fn test_integer_ranges() {
        assert!(decode("byte", "127").is_ok());
        assert!(decode("byte", "128").is_err());
        assert!(decode("unsignedLong", "18446744073709551615").is_ok());
        assert!(decode("positiveInteger", "0").is_err());
        assert!(decode("negativeInteger", "-1").is_ok());
        assert!(decode("integer", "1.0").is_err());
        assert_eq!(decode("integer", "+007").unwrap(), XsdValue::Integer(7));
    }

    #[test]
    fn test_decimal_keeps_scale() {
        let value = decode("decimal", "12.50").unwrap();
        assert_eq!(value.to_json(), JsonValue::String("12.50".into()));
        assert!(decode("decimal", "1e3").is_err());
        assert_eq!(decode("decimal", ".5").unwrap().to_json(), JsonValue::String(".5".into()));
        assert_eq!(decode("decimal", " +1.0 ").unwrap().to_json(), JsonValue::String("+1.0".into()));
        assert_eq!(decode("decimal", "-0.").unwrap().to_string(), "-0.");
    }

    #[test]
    fn test_long_decimal_is_not_rounded() {
        let lexical = "12345678901234567890123456789.5";
        let value = decode("decimal", lexical).unwrap();
        assert_eq!(value.to_json(), JsonValue::String(lexical.into()));

        let longer = decode("decimal", "123456789012345678901234567890123.25").unwrap();
        assert_eq!(longer.to_string(), "123456789012345678901234567890123.25");
    }

    #[test]
    fn test_compare_decimals() {
        assert_eq!(compare_decimals("1.0", "+1"), Ordering::Equal);
        assert_eq!(compare_decimals(".5", "0.49"), Ordering::Greater);
        assert_eq!(compare_decimals("-0.0", "0"), Ordering::Equal);
        let big = "123456789012345678901234567890123";
        assert_eq!(compare_decimals(big, "123456789012345678901234567890122.9"), Ordering::Greater);
        assert_eq!(compare_decimals(&format!("-{}", big), "-1"), Ordering::Less);
        assert_eq!(compare_decimals(&format!("{}.10", big), &format!("{}.1", big)), Ordering::Equal);
        assert_eq!(compare_decimals(&format!("{}.05", big), &format!("{}.1", big)), Ordering::Less);
    }

    #[test]
    fn test_unbounded_integer_beyond_i128() {
        let huge = "1234567890123456789012345678901234567890";
        let value = decode("integer", huge).unwrap();
        assert_eq!(value, XsdValue::BigInteger(huge.into()));
        assert_eq!(value.to_json(), JsonValue::String(huge.into()));
        assert_eq!(
            decode("integer", &format!("+{}", huge)).unwrap(),
            XsdValue::BigInteger(huge.into())
        );

        assert!(decode("nonNegativeInteger", huge).is_ok());
        assert!(decode("nonNegativeInteger", &format!("-{}", huge)).is_err());
        assert!(decode("negativeInteger", &format!("-{}", huge)).is_ok());
        assert!(decode("negativeInteger", huge).is_err());
        assert!(decode("long", huge).is_err());
        assert!(decode("unsignedLong", huge).is_err());
    }

    #[test]
    fn test_big_integer_compares_with_integers() {
        let huge = decode("integer", "1234567890123456789012345678901234567890").unwrap();
        assert_eq!(huge.compare(&XsdValue::Integer(5)), Some(Ordering::Greater));
        assert_eq!(huge.compare(&decode("decimal", "1.5").unwrap()), Some(Ordering::Greater));
    }

    #[test]
    fn test_double_json() {
        assert_eq!(decode("double", "2.5").unwrap().to_json(), serde_json::json!(2.5));
        assert_eq!(
            decode("float", "INF").unwrap().to_json(),
            JsonValue::String("INF".into())
        );
        assert!(decode("double", "abc").is_err());
    }

    #[test]
    fn test_integer_json() {
        assert_eq!(decode("long", "-5").unwrap().to_json(), serde_json::json!(-5));
        assert_eq!(
            decode("integer", "123456789012345678901234567890").unwrap().to_json(),
            JsonValue::String("123456789012345678901234567890".into())
        );
    }

    #[test]
    fn test_boolean() {
        assert_eq!(decode("boolean", "1").unwrap(), XsdValue::Boolean(true));
        assert_eq!(decode("boolean", "false").unwrap().to_json(), JsonValue::Bool(false));
        assert!(decode("boolean", "yes").is_err());
    }

    #[test]
    fn test_dates() {
        assert!(decode("date", "2024-02-29").is_ok());
        assert!(decode("date", "2023-02-29").is_err());
        assert!(decode("date", "2024-02-01Z").is_ok());
        assert!(decode("dateTime", "2024-01-01T10:20:30.5+02:00").is_ok());
        assert!(decode("dateTime", "2024-01-01").is_err());
        assert!(decode("time", "25:00:00").is_err());
        assert!(decode("gYear", "2024").is_ok());
        assert!(decode("gMonthDay", "--12-31").is_ok());
        assert!(decode("duration", "P1Y2M3DT4H").is_ok());
        assert!(decode("duration", "P").is_err());
        assert!(decode("duration", "P1DT").is_err());
    }

    #[test]
    fn test_names() {
        assert!(decode("NCName", "abc").is_ok());
        assert!(decode("NCName", "a:b").is_err());
        assert!(decode("Name", "a:b").is_ok());
        assert!(decode("Name", "1abc").is_err());
        assert!(decode("language", "en-US").is_ok());
        assert!(decode("QName", "xs:string").is_ok());
    }

    #[test]
    fn test_lists() {
        let value = decode("NMTOKENS", " a  b c ").unwrap();
        assert_eq!(value.facet_length(), 3);
        assert_eq!(value.to_json(), serde_json::json!(["a", "b", "c"]));
        assert!(decode("IDREFS", "   ").is_err());
    }

    #[test]
    fn test_binary() {
        let hex = decode("hexBinary", "0FB7").unwrap();
        assert_eq!(hex.facet_length(), 2);
        assert!(decode("hexBinary", "0FB").is_err());
        let b64 = decode("base64Binary", "aGVsbG8=").unwrap();
        assert_eq!(b64.facet_length(), 5);
        assert!(decode("base64Binary", "!!!").is_err());
    }

    #[test]
    fn test_compare() {
        let a = decode("decimal", "1.50").unwrap();
        let b = decode("integer", "2").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(b.compare(&a), Some(Ordering::Greater));
        let c = decode("decimal", "1.5").unwrap();
        assert_eq!(a.compare(&c), Some(Ordering::Equal));
        let d = decode("double", "3.0").unwrap();
        assert_eq!(b.compare(&d), Some(Ordering::Less));
    }

    #[test]
    fn test_error_message_names_type() {
        let err = decode("int", "abc").unwrap_err();
        assert!(err.to_string().contains("xs:int"));
    }
}
