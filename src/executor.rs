//! Application-level request execution
//!
//! The transport already retries overloaded servers and dropped connections.
//! This layer deals with what the transport cannot fix on its own: an expired
//! token (re-authenticate, then repeat the same attempt) and responses that
//! arrive but cannot be used (back off `retry_step * attempt`, then retry).
//! Nothing escapes as an error; exhaustion degrades to an empty page.

use crate::auth::AuthSession;
use crate::config::{ApiConfig, ExecutorConfig};
use crate::error::{Error, Result};
use crate::query::OccurrenceQuery;
use crate::types::{OccurrenceEnvelope, OccurrencePage};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::sync::Arc;
use url::Url;

/// Anything that can answer an occurrence query
///
/// Implementations never fail: an unrecoverable error yields an empty page.
#[async_trait]
pub trait OccurrenceSource: Send + Sync {
    /// Fetch one page of occurrences for `query`
    async fn fetch(&self, query: &OccurrenceQuery) -> OccurrencePage;
}

enum Outcome {
    Page(OccurrencePage),
    Unauthorized,
    Failed(Error),
}

/// Issues occurrence queries through an [`AuthSession`]
#[derive(Debug)]
pub struct RequestExecutor {
    session: Arc<AuthSession>,
    url: Url,
    config: ExecutorConfig,
}

impl RequestExecutor {
    /// Create an executor for the occurrence endpoint
    ///
    /// # Errors
    /// Returns error if the occurrence URL cannot be built
    pub fn new(session: Arc<AuthSession>, api: &ApiConfig, config: ExecutorConfig) -> Result<Self> {
        Ok(Self {
            session,
            url: api.occurrences_url()?,
            config,
        })
    }

    /// Run `query` with re-authentication and bounded retry
    pub async fn execute(&self, query: &OccurrenceQuery) -> OccurrencePage {
        let max_attempts = self.config.max_attempts.max(1);
        let mut reauths = 0;
        let mut attempt = 1;

        while attempt <= max_attempts {
            let token = self.session.current_token().await;

            match self.attempt(query, token.as_deref()).await {
                Outcome::Page(page) => return page,
                Outcome::Unauthorized => {
                    if reauths >= self.config.max_reauth_per_request {
                        tracing::error!(
                            query = query.label(),
                            reauths,
                            "still unauthorized after re-authentication, giving up"
                        );
                        return OccurrencePage::empty();
                    }
                    reauths += 1;
                    tracing::warn!(query = query.label(), "token expired, re-authenticating");
                    if self.session.authenticate().await.is_err() {
                        tracing::error!(
                            query = query.label(),
                            "re-authentication failed, treating as no records"
                        );
                        return OccurrencePage::empty();
                    }
                    // Repeat the same attempt with the new token
                }
                Outcome::Failed(e) if attempt == max_attempts => {
                    tracing::error!(
                        query = query.label(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "occurrence query failed, treating as no records"
                    );
                    return OccurrencePage::empty();
                }
                Outcome::Failed(e) => {
                    let delay = self.config.retry_step * attempt;
                    tracing::warn!(
                        query = query.label(),
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "occurrence query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }

        OccurrencePage::empty()
    }

    async fn attempt(&self, query: &OccurrenceQuery, token: Option<&str>) -> Outcome {
        let transport = self.session.transport();
        let mut request = transport
            .get(self.url.clone())
            .query(&query.params())
            .header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = match transport.send(request).await {
            Ok(response) => response,
            Err(e) => return Outcome::Failed(e),
        };

        match response.status() {
            StatusCode::UNAUTHORIZED => Outcome::Unauthorized,
            StatusCode::NOT_FOUND => {
                tracing::debug!(query = query.label(), "no occurrences found");
                Outcome::Page(OccurrencePage::empty())
            }
            status if !status.is_success() => Outcome::Failed(Error::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            }),
            _ => match parse_page(response).await {
                Ok(page) => Outcome::Page(page),
                Err(e) => Outcome::Failed(e),
            },
        }
    }
}

async fn parse_page(response: reqwest::Response) -> Result<OccurrencePage> {
    let bytes = response.bytes().await?;
    let envelope: OccurrenceEnvelope = serde_json::from_slice(&bytes)?;
    Ok(envelope.into_page())
}

#[async_trait]
impl OccurrenceSource for RequestExecutor {
    async fn fetch(&self, query: &OccurrenceQuery) -> OccurrencePage {
        self.execute(query).await
    }
}
