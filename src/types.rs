//! Wire types for the occurrence-tracking service and the records derived from them

use crate::keys::{RawValue, normalize_number};
use serde::Deserialize;
use serde_json::Value;

/// One occurrence reported by the remote service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccurrenceRecord {
    /// Occurrence status code, trimmed (empty if absent)
    pub code: String,
    /// Canonical order number the occurrence belongs to, if the record carries one
    pub order_number: Option<String>,
}

impl OccurrenceRecord {
    /// Record with only a status code
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            order_number: None,
        }
    }

    /// Record with a status code and owning order number
    pub fn for_order(order_number: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            order_number: Some(order_number.into()),
        }
    }
}

/// One page of occurrence results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccurrencePage {
    /// Records on this page
    pub records: Vec<OccurrenceRecord>,
    /// Total number of pages reported by the server
    pub total_pages: u32,
}

impl OccurrencePage {
    /// No records, no further pages
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    resposta: Option<LoginBody>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    token: Option<String>,
}

impl LoginResponse {
    /// The token, if the server returned a non-empty one
    pub(crate) fn into_token(self) -> Option<String> {
        self.resposta
            .and_then(|body| body.token)
            .filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OccurrenceEnvelope {
    respostas: Option<Vec<WireRecord>>,
    #[serde(rename = "totalPages")]
    total_pages: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(rename = "tipoOcorrencia")]
    kind: Option<WireKind>,
    pedido: Option<WireOrder>,
    embarque: Option<WireShipment>,
}

#[derive(Debug, Deserialize)]
struct WireKind {
    codigo: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    numero: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireShipment {
    pedido: Option<WireOrder>,
}

impl OccurrenceEnvelope {
    pub(crate) fn into_page(self) -> OccurrencePage {
        let total_pages = self.total_pages.as_ref().map_or(0, value_as_count);
        let records = self
            .respostas
            .unwrap_or_default()
            .into_iter()
            .map(WireRecord::into_record)
            .collect();
        OccurrencePage {
            records,
            total_pages,
        }
    }
}

impl WireRecord {
    fn into_record(self) -> OccurrenceRecord {
        let code = self
            .kind
            .and_then(|k| k.codigo)
            .map(|c| value_as_text(&c))
            .unwrap_or_default();

        // The order reference is either top-level or nested in the shipment
        let direct = self.pedido.and_then(|p| p.numero);
        let nested = self.embarque.and_then(|e| e.pedido).and_then(|p| p.numero);
        let order_number = [direct, nested]
            .into_iter()
            .flatten()
            .map(|v| normalize_number(&RawValue::from(&v)))
            .find(|n| !n.is_empty());

        OccurrenceRecord { code, order_number }
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn value_as_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX)),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
