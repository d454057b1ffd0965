//! Router-level tests for the HTTP handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use shared::SettlementCalculator;
use tower::ServiceExt;

use crate::config::{Config, DeductionsConfig, LogConfig, PersistenceConfig, ServerConfig};
use crate::external::OrderStoreClient;
use crate::services::{ReportingService, RetryPolicy, SettlementService};
use crate::AppState;

fn state() -> AppState {
    let persistence = PersistenceConfig {
        base_url: "http://127.0.0.1:9/rest/v1".to_string(),
        api_key: "key".to_string(),
        timeout_secs: 1,
        max_retries: 0,
        retry_backoff_ms: 0,
    };
    let calculator = Arc::new(SettlementCalculator::default());
    AppState {
        settlements: SettlementService::new(
            calculator.clone(),
            OrderStoreClient::new(&persistence).unwrap(),
            RetryPolicy {
                max_retries: 0,
                backoff: Duration::ZERO,
            },
        ),
        reporting: ReportingService::new(calculator),
        config: Arc::new(Config {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            persistence,
            deductions: DeductionsConfig::default(),
            log: LogConfig {
                format: "pretty".to_string(),
            },
        }),
    }
}

async fn send(uri: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    crate::create_app(state()).oneshot(request).await.unwrap()
}

async fn post(uri: &str, body: &str) -> (StatusCode, Value) {
    let response = send(uri, body).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_preview_reports_non_numeric_rate() {
    let (status, body) = post(
        "/api/v1/settlements/preview",
        r#"{"invoice_number": "INV-1", "vehicle_number": "MH12AB1234",
            "commodity": "wheat", "rate_per_mt": "abc",
            "measurement": {"net_weight_mt": "10"}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submittable"], false);
    assert_eq!(body["errors"][0]["kind"], "invalid_value");
    assert_eq!(body["errors"][0]["field"], "rate_per_mt");
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (status, body) = post("/api/v1/settlements/preview", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_commodity_is_bad_request() {
    let (status, body) =
        post("/api/v1/orders/confirm", r#"{"commodity": "barley"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_report_csv_download() {
    let response = send(
        "/api/v1/reports/settlements?format=csv",
        r#"[{"invoice_number": "INV-3", "commodity": "wheat", "rate_per_mt": 2500,
             "measurement": {"net_weight_mt": "10"}}]"#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"settlements.csv\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with("INV-3,,purchase,wheat,,,10.000,2500,25000.00"), "{}", row);
}

#[tokio::test]
async fn test_report_rejects_non_array_body() {
    let (status, body) = post("/api/v1/reports/settlements", r#"{"rows": 1}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
