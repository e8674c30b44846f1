//! Pooled HTTP transport with connection-level retry.

use crate::config::{BackoffConfig, TransportConfig};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use reqwest::{RequestBuilder, Response};
use url::Url;

/// Shared connection pool for the whole run
///
/// Every request goes through [`Transport::send`], which retries timeouts,
/// refused connections and the configured overload statuses. Any other status
/// (401, 404, 400, ...) is handed back as a normal response.
#[derive(Clone, Debug)]
pub struct Transport {
    client: reqwest::Client,
    retry: BackoffConfig,
}

impl Transport {
    /// Build the pooled client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(concat!("delivery-status/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url)
    }

    /// Start a POST request
    pub fn post(&self, url: Url) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request, retrying transient failures
    ///
    /// A retryable status that persists past the last retry comes back as
    /// [`Error::Status`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let retry_statuses = &self.retry.retry_statuses;

        with_retry(&self.retry, || {
            let attempt = request.try_clone();
            async move {
                let attempt = attempt.ok_or_else(|| {
                    Error::Other("request body cannot be cloned for retry".to_string())
                })?;

                let response = attempt.send().await?;
                let status = response.status().as_u16();
                if retry_statuses.contains(&status) {
                    return Err(Error::Status {
                        status,
                        url: response.url().to_string(),
                    });
                }
                Ok(response)
            }
        })
        .await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_transport() -> Transport {
        let config = TransportConfig {
            retry: BackoffConfig {
                max_retries: 3,
                initial_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
                ..Default::default()
            },
            ..Default::default()
        };
        Transport::new(&config).unwrap()
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_retries_overloaded_server_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = fast_transport();
        let response = transport
            .send(transport.get(url(&server, "/busy")))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_persistent_throttling_surfaces_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;

        let transport = fast_transport();
        let err = transport
            .send(transport.get(url(&server, "/throttled")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(429));
    }

    #[tokio::test]
    async fn test_non_retryable_status_passes_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let transport = fast_transport();
        let response = transport
            .send(transport.get(url(&server, "/missing")))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);

        let response = transport
            .send(transport.post(url(&server, "/login")).body("{}"))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = TransportConfig {
            retry: BackoffConfig {
                max_retries: 1,
                initial_delay: Duration::from_millis(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let transport = Transport::new(&config).unwrap();
        // Port 9 (discard) is closed on test hosts
        let err = transport
            .send(transport.get(Url::parse("http://127.0.0.1:9/").unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
