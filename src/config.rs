//! Configuration types for delivery-status
//!
//! A [`Config`] is built once at startup (usually through [`Config::from_env`])
//! and handed by reference to the session, executor and resolver. Nothing reads
//! the environment after that.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable holding the login identity
pub const ENV_IDENTITY: &str = "CF_EMAIL";
/// Environment variable holding the login secret
pub const ENV_SECRET: &str = "CF_SENHA";
/// Optional environment variable overriding the API base URL
pub const ENV_BASE_URL: &str = "CF_BASE_URL";

/// Client account identifier sent at login
pub const CLIENT_ID: u32 = 206;
/// Product identifier sent at login
pub const PRODUCT_ID: u32 = 1;

/// Longest accepted order date window, in days
pub const MAX_DATE_WINDOW_DAYS: i64 = 100_000;

/// Login credentials for the occurrence-tracking service
///
/// The secret is never serialized and is redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identity (e-mail)
    pub identity: String,

    /// Account secret
    #[serde(skip_serializing)]
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }

    /// Load credentials from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary lookup function
    ///
    /// Blank values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::config(format!("{key} is not set"), key))
        };

        Ok(Self {
            identity: read(ENV_IDENTITY)?,
            secret: read(ENV_SECRET)?,
        })
    }
}

/// Remote service endpoints and fixed account identifiers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the service (default: "https://utilities.confirmafacil.com.br")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the login endpoint (default: "/login/login")
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Path of the occurrence filter endpoint (default: "/filter/ocorrencia")
    #[serde(default = "default_occurrences_path")]
    pub occurrences_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            occurrences_path: default_occurrences_path(),
        }
    }
}

impl ApiConfig {
    /// Absolute URL of the login endpoint
    pub fn login_url(&self) -> Result<Url> {
        self.endpoint(&self.login_path)
    }

    /// Absolute URL of the occurrence filter endpoint
    pub fn occurrences_url(&self) -> Result<Url> {
        self.endpoint(&self.occurrences_path)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(path))
            .map_err(|e| Error::config(format!("invalid API URL: {e}"), "base_url"))
    }
}

/// Exponential backoff used by the transport layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Maximum number of retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (default: 500 milliseconds)
    #[serde(default = "default_initial_delay", with = "millis_serde")]
    pub initial_delay: Duration,

    /// Upper bound for a single delay (default: 120 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,

    /// HTTP statuses retried by the transport (default: 429, 500, 502, 503, 504)
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
            retry_statuses: default_retry_statuses(),
        }
    }
}

/// Connection pool, timeouts and low-level retry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Idle connections kept per host (default: 20)
    #[serde(default = "default_pool_size")]
    pub pool_max_idle_per_host: usize,

    /// Connect timeout (default: 5 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Per-request read timeout (default: 60 seconds)
    #[serde(default = "default_read_timeout", with = "duration_serde")]
    pub read_timeout: Duration,

    /// Retry policy for transient server errors
    #[serde(default)]
    pub retry: BackoffConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_size(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            retry: BackoffConfig::default(),
        }
    }
}

/// Application-level retry for a single logical query
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Attempts per query, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Sleep unit between attempts; attempt `n` waits `n * retry_step` (default: 2 seconds)
    #[serde(default = "default_retry_step", with = "millis_serde")]
    pub retry_step: Duration,

    /// Re-authentications allowed within one query (default: 1)
    #[serde(default = "default_max_reauth")]
    pub max_reauth_per_request: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_step: default_retry_step(),
            max_reauth_per_request: default_max_reauth(),
        }
    }
}

/// Batching and paging of lookups
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Records requested per page (default: 1000)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Order numbers per query (default: 20)
    #[serde(default = "default_order_batch_size")]
    pub order_batch_size: usize,

    /// Days back from today covered by order queries (default: 600)
    #[serde(default = "default_date_window_days")]
    pub date_window_days: i64,

    /// Most pages followed for one query, whatever the server reports (default: 1000)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            order_batch_size: default_order_batch_size(),
            date_window_days: default_date_window_days(),
            max_pages: default_max_pages(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Login credentials
    pub credentials: Credentials,

    /// Endpoints and account identifiers
    #[serde(default)]
    pub api: ApiConfig,

    /// Connection pool and transport retry
    #[serde(default)]
    pub transport: TransportConfig,

    /// Application-level retry
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Batching and paging
    #[serde(default)]
    pub lookup: LookupConfig,
}

impl Config {
    /// Configuration with default settings for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api: ApiConfig::default(),
            transport: TransportConfig::default(),
            executor: ExecutorConfig::default(),
            lookup: LookupConfig::default(),
        }
    }

    /// Build the configuration from the process environment
    ///
    /// Reads `CF_EMAIL` and `CF_SENHA` (required) and `CF_BASE_URL` (optional).
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let mut config = Self::new(credentials);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL)
            && !base_url.trim().is_empty()
        {
            config.api.base_url = base_url.trim().to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every lookup fail or loop forever
    pub fn validate(&self) -> Result<()> {
        self.api.login_url()?;
        self.api.occurrences_url()?;

        if self.executor.max_attempts == 0 {
            return Err(Error::config(
                "max_attempts must be at least 1",
                "executor.max_attempts",
            ));
        }
        if self.lookup.page_size == 0 {
            return Err(Error::config(
                "page_size must be at least 1",
                "lookup.page_size",
            ));
        }
        if self.lookup.max_pages == 0 {
            return Err(Error::config(
                "max_pages must be at least 1",
                "lookup.max_pages",
            ));
        }
        if self.lookup.order_batch_size == 0 {
            return Err(Error::config(
                "order_batch_size must be at least 1",
                "lookup.order_batch_size",
            ));
        }
        if !(0..=MAX_DATE_WINDOW_DAYS).contains(&self.lookup.date_window_days) {
            return Err(Error::config(
                format!("date_window_days must be between 0 and {MAX_DATE_WINDOW_DAYS}"),
                "lookup.date_window_days",
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://utilities.confirmafacil.com.br".to_string()
}

fn default_login_path() -> String {
    "/login/login".to_string()
}

fn default_occurrences_path() -> String {
    "/filter/ocorrencia".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(120)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_retry_statuses() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_pool_size() -> usize {
    20
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_step() -> Duration {
    Duration::from_secs(2)
}

fn default_max_reauth() -> u32 {
    1
}

fn default_page_size() -> u32 {
    1000
}

fn default_order_batch_size() -> usize {
    20
}

fn default_date_window_days() -> i64 {
    600
}

fn default_max_pages() -> u32 {
    1000
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second delays)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds =
            Credentials::from_lookup(lookup_from(&[("CF_EMAIL", "ops@example.com"), ("CF_SENHA", "s3cret")]))
                .unwrap();
        assert_eq!(creds.identity, "ops@example.com");
        assert_eq!(creds.secret, "s3cret");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let err = Credentials::from_lookup(lookup_from(&[("CF_EMAIL", "ops@example.com")]))
            .unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("CF_SENHA")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_identity_is_missing() {
        let err = Credentials::from_lookup(lookup_from(&[("CF_EMAIL", "   "), ("CF_SENHA", "x")]))
            .unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("CF_EMAIL")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("ops@example.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("ops@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&Credentials::new("a", "hunter2")).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(Credentials::new("a", "b"));
        assert_eq!(config.transport.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.transport.read_timeout, Duration::from_secs(60));
        assert_eq!(config.transport.retry.retry_statuses, vec![429, 500, 502, 503, 504]);
        assert_eq!(config.executor.max_attempts, 3);
        assert_eq!(config.executor.retry_step, Duration::from_secs(2));
        assert_eq!(config.lookup.order_batch_size, 20);
        assert_eq!(config.lookup.page_size, 1000);
        assert_eq!(config.lookup.date_window_days, 600);
        assert_eq!(config.lookup.max_pages, 1000);
        config.validate().unwrap();
    }

    #[test]
    fn test_endpoint_urls() {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:8080".to_string(),
            ..Default::default()
        };
        assert_eq!(
            api.login_url().unwrap().as_str(),
            "http://127.0.0.1:8080/login/login"
        );
        assert_eq!(
            api.occurrences_url().unwrap().as_str(),
            "http://127.0.0.1:8080/filter/ocorrencia"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::new(Credentials::new("a", "b"));
        config.executor.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new(Credentials::new("a", "b"));
        config.lookup.order_batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new(Credentials::new("a", "b"));
        config.lookup.max_pages = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new(Credentials::new("a", "b"));
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_date_window() {
        let json = r#"{
            "credentials": {"identity": "a", "secret": "b"},
            "lookup": {"date_window_days": 1000000000}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("lookup.date_window_days"))
            }
            other => panic!("expected Config error, got {other:?}"),
        }

        let mut config = Config::new(Credentials::new("a", "b"));
        config.lookup.date_window_days = -1;
        assert!(config.validate().is_err());

        config.lookup.date_window_days = MAX_DATE_WINDOW_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_account_identifiers_are_not_configurable() {
        let json = r#"{
            "credentials": {"identity": "a", "secret": "b"},
            "api": {"client_id": 1, "product_id": 9}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let api = serde_json::to_value(&config.api).unwrap();
        assert!(api.get("client_id").is_none());
        assert_eq!((CLIENT_ID, PRODUCT_ID), (206, 1));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "credentials": {"identity": "a", "secret": "b"},
            "executor": {"max_attempts": 5, "retry_step": 10}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.executor.max_attempts, 5);
        assert_eq!(config.executor.retry_step, Duration::from_millis(10));
        assert_eq!(config.executor.max_reauth_per_request, 1);
        assert_eq!(config.lookup.order_batch_size, 20);
    }
}
