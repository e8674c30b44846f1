//! Reconcile a table exported as JSON
//!
//! Usage:
//!
//! ```text
//! CF_EMAIL=... CF_SENHA=... cargo run --example reconcile -- rows.json order "RETORNO!K:K"
//! ```
//!
//! `rows.json` holds the raw rows as `[[cell, cell], ...]`. The second argument
//! is `invoice` (number + company id columns) or `order` (order number column).
//! The optional third argument is the sheet range the column will be written to.

use delivery_status::{Config, InputTable, KeyKind, Reconciler};
use delivery_status::table::output_range;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("missing rows file argument")?;
    let kind = match args.next().as_deref() {
        Some("invoice") => KeyKind::Invoice,
        Some("order") | None => KeyKind::Order,
        Some(other) => return Err(format!("unknown key kind: {other}").into()),
    };
    let range = args.next();

    let raw = std::fs::read_to_string(&path)?;
    let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(&raw)?;
    let table = InputTable::from_json_rows(kind, &rows);

    let config = Config::from_env()?;
    let reconciler = Reconciler::connect(&config).await?;
    let result = reconciler.reconcile(&table).await;

    if let Some(range) = range {
        println!("range: {}", output_range(&range, table.total_rows));
    }
    println!("{}", serde_json::to_string_pretty(&result.column)?);
    println!("{}", serde_json::to_string_pretty(&result.report)?);

    Ok(())
}
