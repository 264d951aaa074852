// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use safechatter::config::AppConfig;

// Full in-process app (metrics route included) with both models mocked.
fn build_app() -> Router {
    let mut cfg = AppConfig::default();
    cfg.classifier.provider = "mock".into();
    cfg.llm.provider = "mock".into();
    safechatter::app_with_config(&cfg).expect("app should build with mock providers")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn metrics_endpoint_reports_classifier_and_verdict_series() {
    let app = build_app();

    let resp = app
        .clone()
        .oneshot(post_json(
            "/deberta/process",
            r#"{"message":"Move to Telegram please","role":"Sender","history":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(post_json(
            "/deberta/process",
            r#"{"message":"   ","role":"Sender","history":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/mistral/invoke",
            r#"{"input":{"conversation":"SENDER: 'hi there'","frequency":2}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for series in [
        "classifier_requests_total",
        "classifier_ignored_total",
        "classifier_flagged_total",
        "classifier_inference_seconds",
        "verdict_requests_total",
        "verdict_duration_seconds",
    ] {
        assert!(text.contains(series), "missing {series} in:\n{text}");
    }
    assert!(text.contains(r#"label="Channel Shifting Proposal""#));
    assert!(text.contains(r#"outcome="benign""#));
}

#[tokio::test]
async fn second_app_shares_the_recorder() {
    // Metrics::init is idempotent per process
    let _a = build_app();
    let _b = build_app();
}
