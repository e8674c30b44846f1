//! Top-level entry point wiring session, executor and resolver together.

use crate::auth::AuthSession;
use crate::classify::Status;
use crate::config::Config;
use crate::error::Result;
use crate::executor::RequestExecutor;
use crate::resolver::Resolver;
use crate::table::{InputTable, ReportRow, report_rows, status_column};
use crate::transport::Transport;
use std::sync::Arc;

/// Outcome of one reconciliation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    /// One status per data row, in row order
    pub statuses: Vec<Status>,
    /// Column to write back, header included when the input had one
    pub column: Vec<String>,
    /// Valid rows with their status
    pub report: Vec<ReportRow>,
}

impl Reconciliation {
    /// Number of rows with the given status
    pub fn count(&self, status: Status) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }
}

/// An authenticated reconciliation run
pub struct Reconciler {
    session: Arc<AuthSession>,
    resolver: Resolver,
}

impl Reconciler {
    /// Validate the configuration, log in, and prepare the resolver
    ///
    /// # Errors
    /// Returns [`crate::Error::Config`] for invalid settings and
    /// [`crate::Error::Authentication`] if the initial login fails. Both are
    /// fatal: no key can be resolved without a session.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;

        let transport = Transport::new(&config.transport)?;
        let session = Arc::new(AuthSession::new(
            transport,
            config.credentials.clone(),
            &config.api,
        )?);
        session.authenticate().await?;

        let executor = RequestExecutor::new(session.clone(), &config.api, config.executor.clone())?;
        let resolver = Resolver::new(Arc::new(executor), config.lookup.clone());

        Ok(Self { session, resolver })
    }

    /// Resolve every row of `table`
    pub async fn reconcile(&self, table: &InputTable) -> Reconciliation {
        tracing::info!(
            kind = ?table.kind,
            rows = table.keys.len(),
            has_header = table.has_header,
            "starting reconciliation"
        );

        let statuses = self.resolver.resolve(&table.keys).await;
        let column = status_column(table.has_header, &statuses);
        let report = report_rows(&table.keys, &statuses);

        let result = Reconciliation {
            statuses,
            column,
            report,
        };
        tracing::info!(
            delivered = result.count(Status::Entregue),
            cancelled = result.count(Status::Cancelado),
            missing = result.count(Status::Missing),
            "reconciliation finished"
        );
        result
    }

    /// Session used by this run
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Resolver used by this run
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
