//! Lookup keys and their canonical form
//!
//! Spreadsheet cells arrive as integers, floats (`123.0`), text with stray
//! whitespace or punctuation, or nothing at all. Everything is normalized here
//! once, so the rest of the crate only ever compares canonical strings.
//!
//! Canonical form:
//! - invoice and order numbers: trimmed decimal text with no `.0` suffix
//! - company ids: digits only, left-padded with zeros to 14 characters
//! - anything empty or NaN: the empty string, which is never a valid key

use crate::classify::Status;
use std::fmt;

/// Width of a canonical company id (CNPJ)
pub const COMPANY_ID_LEN: usize = 14;

/// A raw cell value as read from the tabular source
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// Blank cell
    Empty,
    /// Integer cell
    Integer(i64),
    /// Floating point cell (spreadsheets often store ids this way)
    Float(f64),
    /// Text cell
    Text(String),
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Empty,
            serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Integer(i),
                None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

/// Canonicalize an invoice or order number
pub fn normalize_number(raw: &RawValue) -> String {
    match raw {
        RawValue::Empty => String::new(),
        RawValue::Integer(i) => i.to_string(),
        RawValue::Float(f) if f.is_nan() => String::new(),
        RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        RawValue::Float(f) => f.to_string(),
        RawValue::Text(text) => normalize_number_text(text),
    }
}

/// Canonicalize a company id (CNPJ)
pub fn normalize_company_id(raw: &RawValue) -> String {
    let text = match raw {
        RawValue::Empty => return String::new(),
        RawValue::Integer(i) => i.to_string(),
        RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        RawValue::Float(_) => return String::new(),
        RawValue::Text(text) => normalize_number_text(text),
    };

    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }
    format!("{digits:0>width$}", width = COMPANY_ID_LEN)
}

fn normalize_number_text(text: &str) -> String {
    let text = text.trim();
    if text.eq_ignore_ascii_case("nan") {
        return String::new();
    }
    match text.strip_suffix(".0") {
        Some(stem) if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) => {
            stem.to_string()
        }
        _ => text.to_string(),
    }
}

/// Which shape of key a lookup uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Invoice number + company id, queried one key per request
    Invoice,
    /// Order number, queried in sub-batches
    Order,
}

impl KeyKind {
    /// Status reported when a valid key has no matching occurrence
    pub fn default_status(self) -> Status {
        match self {
            KeyKind::Invoice => Status::NotFound,
            KeyKind::Order => Status::Despachado,
        }
    }
}

/// A canonical lookup key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// Invoice number issued by a company
    Invoice {
        /// Canonical invoice number
        number: String,
        /// Canonical 14-digit company id
        company: String,
    },
    /// Customer order number
    Order(String),
}

impl LookupKey {
    /// Build an invoice key from raw cells
    pub fn invoice(number: &RawValue, company: &RawValue) -> Self {
        LookupKey::Invoice {
            number: normalize_number(number),
            company: normalize_company_id(company),
        }
    }

    /// Build an order key from a raw cell
    pub fn order(number: &RawValue) -> Self {
        LookupKey::Order(normalize_number(number))
    }

    /// Shape of this key
    pub fn kind(&self) -> KeyKind {
        match self {
            LookupKey::Invoice { .. } => KeyKind::Invoice,
            LookupKey::Order(_) => KeyKind::Order,
        }
    }

    /// A key is looked up only when every component is non-empty
    pub fn is_valid(&self) -> bool {
        match self {
            LookupKey::Invoice { number, company } => !number.is_empty() && !company.is_empty(),
            LookupKey::Order(number) => !number.is_empty(),
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Invoice { number, company } => write!(f, "{number}/{company}"),
            LookupKey::Order(number) => write!(f, "{number}"),
        }
    }
}
