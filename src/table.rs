//! Boundary with the external tabular source
//!
//! Reading and writing the sheet itself happens outside this crate. What lives
//! here is the shape of the exchange: raw rows in, one key per data row, and an
//! output column of equal length (plus a `STATUS` header when the input had
//! one) out.

use crate::classify::Status;
use crate::keys::{KeyKind, LookupKey, RawValue};
use serde::Serialize;

/// Header written above the status column
pub const STATUS_HEADER: &str = "STATUS";

const INVOICE_HEADERS: [&str; 4] = ["nf", "nota", "nota fiscal", "numero"];
const COMPANY_HEADERS: [&str; 2] = ["cnpj", "estabelecimento"];
const ORDER_HEADERS: [&str; 2] = ["pedido", "pedidos"];

/// Keys read from the tabular source, one per data row
#[derive(Clone, Debug, PartialEq)]
pub struct InputTable {
    /// Key shape of this table
    pub kind: KeyKind,
    /// Whether the first raw row was a header
    pub has_header: bool,
    /// One key per data row, in row order
    pub keys: Vec<LookupKey>,
    /// Raw row count, header included
    pub total_rows: usize,
}

impl InputTable {
    /// Build keys from raw rows
    ///
    /// Invoice tables read the invoice number from column 0 and the company id
    /// from column 1; order tables read the order number from column 0. Short
    /// rows are treated as blank cells.
    pub fn from_rows(kind: KeyKind, rows: &[Vec<RawValue>]) -> Self {
        let has_header = rows.first().is_some_and(|row| is_header(kind, row));
        let data = if has_header { &rows[1..] } else { rows };

        let keys = data
            .iter()
            .map(|row| match kind {
                KeyKind::Invoice => LookupKey::invoice(cell(row, 0), cell(row, 1)),
                KeyKind::Order => LookupKey::order(cell(row, 0)),
            })
            .collect();

        Self {
            kind,
            has_header,
            keys,
            total_rows: rows.len(),
        }
    }

    /// Build keys from JSON rows (`[[cell, cell], ...]`)
    pub fn from_json_rows(kind: KeyKind, rows: &[Vec<serde_json::Value>]) -> Self {
        let rows: Vec<Vec<RawValue>> = rows
            .iter()
            .map(|row| row.iter().map(RawValue::from).collect())
            .collect();
        Self::from_rows(kind, &rows)
    }
}

static EMPTY_CELL: RawValue = RawValue::Empty;

fn cell(row: &[RawValue], index: usize) -> &RawValue {
    row.get(index).unwrap_or(&EMPTY_CELL)
}

fn header_text(row: &[RawValue], index: usize) -> String {
    match cell(row, index) {
        RawValue::Text(text) => text.trim().to_lowercase(),
        _ => String::new(),
    }
}

fn is_header(kind: KeyKind, row: &[RawValue]) -> bool {
    let first = header_text(row, 0);
    match kind {
        KeyKind::Invoice => {
            INVOICE_HEADERS.contains(&first.as_str())
                || COMPANY_HEADERS.contains(&header_text(row, 1).as_str())
        }
        KeyKind::Order => ORDER_HEADERS.contains(&first.as_str()),
    }
}

/// Output column to write back, aligned with the input rows
pub fn status_column(has_header: bool, statuses: &[Status]) -> Vec<String> {
    let header = has_header.then(|| STATUS_HEADER.to_string());
    header
        .into_iter()
        .chain(statuses.iter().map(|s| s.as_str().to_string()))
        .collect()
}

/// Anchor an output range like `SHEET!K:K` at row 1 and size it to `total_rows`
///
/// Ranges without a sheet prefix or column letters are returned unchanged.
pub fn output_range(range: &str, total_rows: usize) -> String {
    let Some((sheet, cols)) = range.split_once('!') else {
        return range.to_string();
    };
    let first = cols.split(':').next().unwrap_or_default().trim();
    let letters: String = first.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return range.to_string();
    }
    let end_row = total_rows.max(1);
    format!("{sheet}!{letters}1:{letters}{end_row}")
}

/// One line of the run report
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportRow {
    /// Invoice row
    Invoice {
        /// Invoice number
        #[serde(rename = "NF")]
        number: String,
        /// Company id
        #[serde(rename = "CNPJ")]
        company: String,
        /// Resolved status
        #[serde(rename = "STATUS")]
        status: Status,
    },
    /// Order row
    Order {
        /// Order number
        #[serde(rename = "PEDIDO")]
        number: String,
        /// Resolved status
        #[serde(rename = "STATUS")]
        status: Status,
    },
}

/// Report rows for every valid input key, duplicates included, in input order
pub fn report_rows(keys: &[LookupKey], statuses: &[Status]) -> Vec<ReportRow> {
    keys.iter()
        .zip(statuses)
        .filter(|(key, _)| key.is_valid())
        .map(|(key, status)| match key {
            LookupKey::Invoice { number, company } => ReportRow::Invoice {
                number: number.clone(),
                company: company.clone(),
                status: *status,
            },
            LookupKey::Order(number) => ReportRow::Order {
                number: number.clone(),
                status: *status,
            },
        })
        .collect()
}
