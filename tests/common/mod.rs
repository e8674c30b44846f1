//! Common test utilities for delivery-status integration tests

#![allow(dead_code)]

use delivery_status::config::{BackoffConfig, ExecutorConfig, TransportConfig};
use delivery_status::{Config, Credentials};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token handed out by [`mount_login`]
pub const TOKEN: &str = "token-1";

/// Company id used by the invoice scenarios
pub const COMPANY: &str = "12345678000199";

/// Initialize tracing for a test, honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config pointed at `server` with millisecond retry delays
pub fn fast_config(server: &MockServer) -> Config {
    let mut config = Config::new(Credentials::new("ops@example.com", "secret"));
    config.api.base_url = server.uri();
    config.transport = TransportConfig {
        retry: BackoffConfig {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..Default::default()
        },
        ..Default::default()
    };
    config.executor = ExecutorConfig {
        retry_step: Duration::from_millis(1),
        ..Default::default()
    };
    config
}

/// Mount a login endpoint that always succeeds
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resposta": {"token": TOKEN}
        })))
        .mount(server)
        .await;
}

/// Occurrence page body with the given records
pub fn page(records: Vec<Value>, total_pages: u32) -> Value {
    json!({"respostas": records, "totalPages": total_pages})
}

/// An invoice occurrence record
pub fn invoice_record(code: &str) -> Value {
    json!({"tipoOcorrencia": {"codigo": code}})
}

/// An order occurrence record attributed through `pedido.numero`
pub fn order_record(order: &str, code: &str) -> Value {
    json!({"tipoOcorrencia": {"codigo": code}, "pedido": {"numero": order}})
}

/// Mount an occurrence response for one invoice key
pub async fn mount_invoice(server: &MockServer, number: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .and(query_param("numero", number))
        .and(query_param("cnpjEmbarcador", COMPANY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount an occurrence response for one order batch
pub async fn mount_orders(server: &MockServer, joined: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .and(query_param("pedido", joined))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
