//! End-to-end reconciliation runs against a mocked occurrence service

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use delivery_status::{Error, InputTable, KeyKind, RawValue, Reconciler, Status};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn invoice_row(number: &str, company: &str) -> Vec<RawValue> {
    vec![RawValue::from(number), RawValue::from(company)]
}

#[tokio::test]
async fn test_invoice_rows_resolve_to_expected_statuses() {
    init_tracing();
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_invoice(&server, "00123", page(vec![invoice_record("1")], 1)).await;
    mount_invoice(&server, "00124", page(vec![invoice_record("25")], 1)).await;
    mount_invoice(&server, "00125", page(vec![], 0)).await;

    let reconciler = Reconciler::connect(&fast_config(&server)).await.unwrap();
    let rows = vec![
        invoice_row("00123", COMPANY),
        invoice_row("00124", COMPANY),
        invoice_row("00125", COMPANY),
        invoice_row("", COMPANY),
    ];
    let table = InputTable::from_rows(KeyKind::Invoice, &rows);
    let result = reconciler.reconcile(&table).await;

    assert_eq!(
        result.statuses,
        vec![
            Status::Entregue,
            Status::Cancelado,
            Status::NotFound,
            Status::Missing
        ]
    );
    assert_eq!(result.column, vec!["ENTREGUE", "CANCELADO", "-", ""]);
    assert_eq!(result.report.len(), 3);
}

#[tokio::test]
async fn test_header_row_gets_status_header() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_invoice(&server, "00123", page(vec![invoice_record("999")], 1)).await;

    let reconciler = Reconciler::connect(&fast_config(&server)).await.unwrap();
    let rows = vec![
        invoice_row("NF", "CNPJ"),
        invoice_row("00123", COMPANY),
    ];
    let table = InputTable::from_rows(KeyKind::Invoice, &rows);
    let result = reconciler.reconcile(&table).await;

    assert!(table.has_header);
    assert_eq!(result.column, vec!["STATUS", "ENTREGUE"]);
}

#[tokio::test]
async fn test_duplicate_keys_are_queried_once() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    // mount_invoice expects exactly one call
    mount_invoice(&server, "00123", page(vec![invoice_record("1")], 1)).await;

    let reconciler = Reconciler::connect(&fast_config(&server)).await.unwrap();
    let rows = vec![
        invoice_row("00123", COMPANY),
        invoice_row(" 00123 ", "12.345.678/0001-99"),
        invoice_row("00123", COMPANY),
    ];
    let table = InputTable::from_rows(KeyKind::Invoice, &rows);
    let result = reconciler.reconcile(&table).await;

    assert_eq!(result.count(Status::Entregue), 3);
    assert_eq!(result.report.len(), 3);
}

#[tokio::test]
async fn test_orders_without_records_are_dispatched() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_orders(
        &server,
        "555,556",
        page(vec![order_record("556", "2")], 1),
    )
    .await;

    let reconciler = Reconciler::connect(&fast_config(&server)).await.unwrap();
    let rows = vec![
        vec![json!("Pedido")],
        vec![json!(555)],
        vec![json!("556.0")],
        vec![json!(null)],
    ];
    let table = InputTable::from_json_rows(KeyKind::Order, &rows);
    let result = reconciler.reconcile(&table).await;

    assert_eq!(result.column, vec!["STATUS", "DESPACHADO", "ENTREGUE", ""]);
}

#[tokio::test]
async fn test_order_pages_are_followed() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .and(query_param("page", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![order_record("10", "25")], 2)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(vec![order_record("11", "1")], 2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::connect(&fast_config(&server)).await.unwrap();
    let rows = vec![vec![json!("10")], vec![json!("11")]];
    let table = InputTable::from_json_rows(KeyKind::Order, &rows);
    let result = reconciler.reconcile(&table).await;

    assert_eq!(result.statuses, vec![Status::Cancelado, Status::Entregue]);
}

#[tokio::test]
async fn test_failed_batch_defaults_and_run_continues() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    // 3 executor attempts, each with one transport retry
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .and(query_param("pedido", "1,2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(6)
        .mount(&server)
        .await;
    mount_orders(&server, "3", page(vec![order_record("3", "1")], 1)).await;

    let mut config = fast_config(&server);
    config.lookup.order_batch_size = 2;
    let reconciler = Reconciler::connect(&config).await.unwrap();
    let rows = vec![vec![json!("1")], vec![json!("2")], vec![json!("3")]];
    let table = InputTable::from_json_rows(KeyKind::Order, &rows);
    let result = reconciler.reconcile(&table).await;

    assert_eq!(
        result.statuses,
        vec![Status::Despachado, Status::Despachado, Status::Entregue]
    );
}

#[tokio::test]
async fn test_startup_login_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/login"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter/ocorrencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], 0)))
        .expect(0)
        .mount(&server)
        .await;

    let err = Reconciler::connect(&fast_config(&server))
        .await
        .err()
        .expect("login should fail");
    assert!(matches!(err, Error::Authentication(_)));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = fast_config(&server);
    config.executor.max_attempts = 0;
    let err = Reconciler::connect(&config).await.err().expect("invalid config");
    assert!(matches!(err, Error::Config { .. }));
}
