//! Key resolution: deduplicate, batch, fetch, classify, re-expand
//!
//! The resolver is the only place that knows about both ends of the pipeline.
//! It takes the raw key list exactly as read (duplicates and blanks included),
//! looks every unique valid key up at most once, and returns one status per
//! input position.
//!
//! Failures never abort a run. A query that fails after all retries yields no
//! records, so the affected keys fall back to their default status while every
//! other key is still resolved.

use crate::batch::{batch_size, batches};
use crate::classify::{Evidence, Status, classify};
use crate::config::LookupConfig;
use crate::executor::OccurrenceSource;
use crate::keys::{KeyKind, LookupKey};
use crate::paginate::fetch_all_pages;
use crate::query::{DateWindow, OccurrenceQuery};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Status of every unique key resolved in one run
#[derive(Clone, Debug, Default)]
pub struct ResolutionTable {
    statuses: HashMap<LookupKey, Status>,
}

impl ResolutionTable {
    /// Record the status of `key`; a key already present keeps its first status
    fn record(&mut self, key: LookupKey, status: Status) -> bool {
        match self.statuses.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                tracing::warn!(key = %entry.key(), "key already resolved, ignoring second result");
                false
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(status);
                true
            }
        }
    }

    /// Status of `key`, if it was resolved
    pub fn get(&self, key: &LookupKey) -> Option<Status> {
        self.statuses.get(key).copied()
    }

    /// Number of resolved keys
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// True if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Status for one input position
    ///
    /// Invalid keys map to [`Status::Missing`] so a blank input stays visibly
    /// different from "looked up, nothing found".
    pub fn status_for(&self, key: &LookupKey) -> Status {
        if !key.is_valid() {
            return Status::Missing;
        }
        self.get(key)
            .unwrap_or_else(|| key.kind().default_status())
    }
}

/// Valid keys in first-occurrence order, each once
pub fn unique_valid_keys(keys: &[LookupKey]) -> Vec<LookupKey> {
    let mut seen = HashSet::new();
    keys.iter()
        .filter(|key| key.is_valid())
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}

/// Orchestrates lookups against an [`OccurrenceSource`]
pub struct Resolver {
    source: Arc<dyn OccurrenceSource>,
    lookup: LookupConfig,
}

impl Resolver {
    /// Create a resolver over `source`
    pub fn new(source: Arc<dyn OccurrenceSource>, lookup: LookupConfig) -> Self {
        Self { source, lookup }
    }

    /// Resolve `keys`, returning one status per input position
    pub async fn resolve(&self, keys: &[LookupKey]) -> Vec<Status> {
        let table = self.build_table(keys).await;
        keys.iter().map(|key| table.status_for(key)).collect()
    }

    /// Look up every unique valid key once
    pub async fn build_table(&self, keys: &[LookupKey]) -> ResolutionTable {
        let unique = unique_valid_keys(keys);
        let (invoices, orders): (Vec<LookupKey>, Vec<LookupKey>) = unique
            .into_iter()
            .partition(|key| key.kind() == KeyKind::Invoice);

        tracing::info!(
            input = keys.len(),
            invoices = invoices.len(),
            orders = orders.len(),
            "resolving unique keys"
        );

        let mut table = ResolutionTable::default();
        self.resolve_invoices(&invoices, &mut table).await;
        self.resolve_orders(&orders, &mut table).await;
        table
    }

    async fn resolve_invoices(&self, invoices: &[LookupKey], table: &mut ResolutionTable) {
        let size = batch_size(KeyKind::Invoice, &self.lookup);
        for chunk in batches(invoices, size) {
            for key in chunk {
                let LookupKey::Invoice { number, company } = key else {
                    continue;
                };
                let query = OccurrenceQuery::for_invoice(number, company);
                let records =
                    fetch_all_pages(self.source.as_ref(), &query, self.lookup.max_pages).await;
                let status = classify(
                    records.iter().map(|r| r.code.as_str()),
                    KeyKind::Invoice.default_status(),
                );
                tracing::debug!(key = %key, records = records.len(), status = %status, "resolved invoice");
                table.record(key.clone(), status);
            }
        }
    }

    async fn resolve_orders(&self, orders: &[LookupKey], table: &mut ResolutionTable) {
        if orders.is_empty() {
            return;
        }

        let window = DateWindow::last_days(self.lookup.date_window_days);
        let size = batch_size(KeyKind::Order, &self.lookup);
        let total_batches = orders.len().div_ceil(size);

        for (index, chunk) in batches(orders, size).enumerate() {
            let numbers: Vec<String> = chunk
                .iter()
                .filter_map(|key| match key {
                    LookupKey::Order(number) => Some(number.clone()),
                    LookupKey::Invoice { .. } => None,
                })
                .collect();

            let query = OccurrenceQuery::for_orders(&numbers, self.lookup.page_size, window);
            let records =
                fetch_all_pages(self.source.as_ref(), &query, self.lookup.max_pages).await;

            // Demultiplex by the order number embedded in each record
            let mut evidence: HashMap<&str, Evidence> =
                numbers.iter().map(|n| (n.as_str(), Evidence::default())).collect();
            let mut unowned = 0usize;
            for record in &records {
                match record
                    .order_number
                    .as_deref()
                    .and_then(|owner| evidence.get_mut(owner))
                {
                    Some(seen) => *seen = seen.observe(&record.code),
                    None => unowned += 1,
                }
            }

            tracing::info!(
                batch = index + 1,
                batches = total_batches,
                keys = numbers.len(),
                records = records.len(),
                unowned,
                "resolved order batch"
            );

            for key in chunk {
                let LookupKey::Order(number) = key else {
                    continue;
                };
                let status = evidence
                    .get(number.as_str())
                    .copied()
                    .unwrap_or_default()
                    .classify(KeyKind::Order.default_status());
                table.record(key.clone(), status);
            }
        }
    }
}
