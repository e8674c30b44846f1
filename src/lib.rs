//! # delivery-status
//!
//! Batch reconciliation of shipment delivery status against an
//! occurrence-tracking service.
//!
//! Given the rows of an external table (invoice + company id pairs, or order
//! numbers), the crate works out for each row whether the shipment was
//! delivered (`ENTREGUE`), cancelled (`CANCELADO`), or neither, and hands back
//! a status column aligned with the input.
//!
//! ## Pipeline
//!
//! - raw cells are normalized into [`LookupKey`]s ([`keys`])
//! - unique valid keys are batched ([`batch`]) and queried ([`executor`]),
//!   following every result page ([`paginate`])
//! - occurrence codes are folded into a status ([`classify`])
//! - statuses are re-expanded to the original row order ([`resolver`])
//!
//! Requests run one at a time over a single pooled connection set. Transport
//! failures are retried at two layers (see [`retry`] and [`executor`]), and a
//! lookup that still fails only affects its own keys.
//!
//! ## Quick Start
//!
//! ```no_run
//! use delivery_status::{Config, InputTable, KeyKind, Reconciler};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // CF_EMAIL / CF_SENHA from the environment or a .env file
//!     let config = Config::from_env()?;
//!     let reconciler = Reconciler::connect(&config).await?;
//!
//!     let rows = vec![
//!         vec![json!("Pedido")],
//!         vec![json!(555)],
//!         vec![json!("556")],
//!     ];
//!     let table = InputTable::from_json_rows(KeyKind::Order, &rows);
//!     let result = reconciler.reconcile(&table).await;
//!
//!     for value in result.column {
//!         println!("{value}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Login and token ownership
pub mod auth;
/// Sub-batching of lookup keys
pub mod batch;
/// Status classification from occurrence codes
pub mod classify;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Application-level request execution
pub mod executor;
/// Lookup keys and normalization
pub mod keys;
/// Page accumulation
pub mod paginate;
/// Occurrence query construction
pub mod query;
/// Top-level reconciliation run
pub mod reconciler;
/// Key resolution
pub mod resolver;
/// Retry logic with exponential backoff
pub mod retry;
/// Tabular source boundary
pub mod table;
/// Pooled HTTP transport
pub mod transport;
/// Wire types and occurrence records
pub mod types;

// Re-export commonly used types
pub use auth::AuthSession;
pub use classify::Status;
pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use executor::{OccurrenceSource, RequestExecutor};
pub use keys::{KeyKind, LookupKey, RawValue};
pub use reconciler::{Reconciler, Reconciliation};
pub use resolver::{ResolutionTable, Resolver};
pub use table::{InputTable, ReportRow};
pub use types::{OccurrencePage, OccurrenceRecord};
