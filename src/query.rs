//! Occurrence query construction
//!
//! A query is an immutable list of URL parameters plus optional paging. The
//! paginator derives follow-up queries from it by swapping the page index only.

use crate::classify::code_filter;
use chrono::{Duration, NaiveDate};

/// Inclusive date range used by order queries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    /// First day covered
    pub from: NaiveDate,
    /// Last day covered
    pub to: NaiveDate,
}

impl DateWindow {
    /// Window of `days` days ending on `to`
    ///
    /// A window reaching past the earliest representable date starts there.
    pub fn ending(to: NaiveDate, days: i64) -> Self {
        let from = Duration::try_days(days)
            .and_then(|span| to.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to }
    }

    /// Window of `days` days ending today (local time)
    pub fn last_days(days: i64) -> Self {
        Self::ending(chrono::Local::now().date_naive(), days)
    }

    fn from_param(&self) -> String {
        format!("{} 00:00:00", self.from.format("%Y/%m/%d"))
    }

    fn to_param(&self) -> String {
        format!("{} 23:59:59", self.to.format("%Y/%m/%d"))
    }
}

/// Page index and size of a paged query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging {
    /// Zero-based page index
    pub index: u32,
    /// Records per page
    pub size: u32,
}

/// One logical occurrence lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccurrenceQuery {
    label: String,
    params: Vec<(&'static str, String)>,
    paging: Option<Paging>,
}

impl OccurrenceQuery {
    /// Lookup of one invoice issued by one company
    pub fn for_invoice(number: &str, company: &str) -> Self {
        Self {
            label: format!("{number}/{company}"),
            params: vec![
                ("numero", number.to_string()),
                ("cnpjEmbarcador", company.to_string()),
                ("codigoOcorrencia", code_filter()),
            ],
            paging: None,
        }
    }

    /// Lookup of a batch of order numbers within a date window, starting at page 0
    pub fn for_orders(orders: &[String], page_size: u32, window: DateWindow) -> Self {
        let joined = orders.join(",");
        Self {
            label: joined.clone(),
            params: vec![
                ("pedido", joined),
                ("de", window.from_param()),
                ("ate", window.to_param()),
                ("codigoOcorrencia", code_filter()),
                ("tipoData", "OCORRENCIA".to_string()),
            ],
            paging: Some(Paging {
                index: 0,
                size: page_size,
            }),
        }
    }

    /// Same query for another page, or `None` if the query is not paged
    pub fn with_page(&self, index: u32) -> Option<Self> {
        let paging = self.paging?;
        Some(Self {
            paging: Some(Paging { index, ..paging }),
            ..self.clone()
        })
    }

    /// Paging of this query, if any
    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    /// Short description of the keys being searched, for logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All URL parameters, paging included
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.params.clone();
        if let Some(paging) = self.paging {
            params.push(("page", paging.index.to_string()));
            params.push(("size", paging.size.to_string()));
        }
        params
    }
}
