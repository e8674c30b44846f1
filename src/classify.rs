//! Status classification from occurrence codes
//!
//! Classification is a pure fold: every code seen for a key is folded into an
//! [`Evidence`] value, and the evidence is classified once at the end. Delivery
//! always wins over cancellation, whatever order the codes arrive in.

use serde::{Serialize, Serializer};
use std::fmt;

/// Occurrence codes meaning the shipment was delivered
pub const DELIVERED_CODES: [&str; 4] = ["1", "2", "37", "999"];

/// Occurrence codes meaning the shipment was cancelled
pub const CANCELLED_CODES: [&str; 6] = ["25", "102", "203", "303", "325", "327"];

/// Resolved status of one input row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Delivered (`ENTREGUE`)
    Entregue,
    /// Cancelled (`CANCELADO`)
    Cancelado,
    /// Order found no terminal occurrence (`DESPACHADO`)
    Despachado,
    /// Invoice found no terminal occurrence (`-`)
    NotFound,
    /// Input row had no usable key (empty string)
    Missing,
}

impl Status {
    /// Text written back to the tabular source
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Entregue => "ENTREGUE",
            Status::Cancelado => "CANCELADO",
            Status::Despachado => "DESPACHADO",
            Status::NotFound => "-",
            Status::Missing => "",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Returns true if `code` marks a delivery
pub fn is_delivered(code: &str) -> bool {
    DELIVERED_CODES.contains(&code)
}

/// Returns true if `code` marks a cancellation
pub fn is_cancelled(code: &str) -> bool {
    CANCELLED_CODES.contains(&code)
}

/// Comma-joined filter of every relevant code, sorted numerically
///
/// Sent with each occurrence query so the server only returns terminal events.
pub fn code_filter() -> String {
    let mut codes: Vec<u32> = DELIVERED_CODES
        .iter()
        .chain(CANCELLED_CODES.iter())
        .filter_map(|c| c.parse().ok())
        .collect();
    codes.sort_unstable();
    codes.dedup();
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// What has been observed for one key so far
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    /// At least one delivery code was seen
    pub delivered: bool,
    /// At least one cancellation code was seen
    pub cancelled: bool,
}

impl Evidence {
    /// Fold one occurrence code into the evidence
    #[must_use]
    pub fn observe(self, code: &str) -> Self {
        let code = code.trim();
        Self {
            delivered: self.delivered || is_delivered(code),
            cancelled: self.cancelled || is_cancelled(code),
        }
    }

    /// Delivered beats cancelled; otherwise `default`
    pub fn classify(self, default: Status) -> Status {
        if self.delivered {
            Status::Entregue
        } else if self.cancelled {
            Status::Cancelado
        } else {
            default
        }
    }
}

/// Classify a set of occurrence codes
pub fn classify<'a, I>(codes: I, default: Status) -> Status
where
    I: IntoIterator<Item = &'a str>,
{
    codes
        .into_iter()
        .fold(Evidence::default(), Evidence::observe)
        .classify(default)
}
