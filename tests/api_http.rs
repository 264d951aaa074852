// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with both model
// collaborators replaced by in-process mocks.
//
// Covered:
// - GET /, GET /health
// - POST /deberta/process (flagging, empty message, escaping, upstream failure)
// - POST /deberta/reset
// - POST /api/mistral/invoke, /api/mistral/batch (+ parse/schema failures)
// - GET /api/mistral/{input,output}_schema

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use safechatter::agent::{AgentSettings, IGNORED_MARKER};
use safechatter::api::{self, AppState};
use safechatter::classifier::MockClassifier;
use safechatter::labels::candidate_labels;
use safechatter::verdict::MockLlm;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Same Router the binary uses, minus `/metrics`.
fn test_router() -> Router {
    api::router(AppState::mock())
}

fn router_with(classifier: MockClassifier, llm: MockLlm) -> Router {
    api::router(AppState::with_backends(
        Arc::new(classifier),
        Arc::new(llm),
        candidate_labels(),
        AgentSettings::default(),
    ))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let resp = test_router().oneshot(get("/health")).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(String::from_utf8(bytes.to_vec()).expect("utf8").trim(), "ok");
}

#[tokio::test]
async fn root_lists_every_route() {
    let (status, v) = send(test_router(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
    let paths = v["paths"].as_object().expect("paths object");
    for p in [
        "/deberta/process",
        "/deberta/reset",
        "/api/mistral/invoke",
        "/api/mistral/batch",
        "/metrics",
    ] {
        assert!(paths.values().any(|x| x == p), "missing path {p}");
    }
}

#[tokio::test]
async fn process_flags_channel_shift_and_appends_turn() {
    let payload = json!({
        "message": "Add me on WhatsApp, easier to talk",
        "role": "Sender",
        "history": []
    });
    let (status, v) = send(test_router(), post_json("/deberta/process", payload)).await;
    assert_eq!(status, StatusCode::OK, "body: {v}");

    let scores = v["scores"].as_array().expect("scores array");
    assert_eq!(scores.len(), 8, "one record per category");
    assert_eq!(scores[0]["Label"], "Channel Shifting Proposal");
    assert_eq!(scores[0]["Score"], 0.95);

    assert_eq!(v["flagged"], json!(["Channel Shifting Proposal (0.95)"]));
    assert_eq!(v["ignored"], false);
    assert!(v["inference_time"].as_f64().expect("inference_time") >= 0.0);
    assert!(v["display_html"]
        .as_str()
        .expect("display_html")
        .contains("Potential signals: Channel Shifting Proposal (0.95)"));

    assert_eq!(
        v["updated_history"],
        json!([{ "role": "Sender", "text": "Add me on WhatsApp, easier to talk" }])
    );
}

#[tokio::test]
async fn process_without_history_field_starts_fresh() {
    let payload = json!({ "message": "See you at lunch", "role": "Receiver" });
    let (status, v) = send(test_router(), post_json("/deberta/process", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["flagged"], json!([]));
    assert_eq!(v["scores"][0]["Label"], "Genuinity");
    assert_eq!(v["updated_history"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn empty_message_is_ignored_and_history_returned_unchanged() {
    let history = json!([
        { "role": "Sender", "text": "hi" },
        { "role": "Receiver", "text": "who is this?" }
    ]);
    let payload = json!({ "message": "   \n ", "role": "Sender", "history": history });
    let (status, v) = send(test_router(), post_json("/deberta/process", payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ignored"], true);
    assert_eq!(v["display_html"], IGNORED_MARKER);
    assert_eq!(v["updated_history"], history);
    assert_eq!(v["inference_time"], 0.0);
    let scores = v["scores"].as_array().expect("scores array");
    assert_eq!(scores.len(), 8);
    assert!(scores.iter().all(|r| r["Score"] == 0.0));
}

#[tokio::test]
async fn message_text_is_html_escaped() {
    let payload = json!({ "message": "<b>hello</b>", "role": "Sender", "history": [] });
    let (_, v) = send(test_router(), post_json("/deberta/process", payload)).await;
    let html = v["display_html"].as_str().expect("display_html");
    assert!(html.starts_with("&lt;b&gt;hello&lt;/b&gt;"), "got {html}");
    // history keeps the raw text
    assert_eq!(v["updated_history"][0]["text"], "<b>hello</b>");
}

#[tokio::test]
async fn process_requires_role() {
    let payload = json!({ "message": "hello" });
    let resp = test_router()
        .oneshot(post_json("/deberta/process", payload))
        .await
        .expect("oneshot");
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}

#[tokio::test]
async fn classifier_failure_is_bad_gateway() {
    let app = router_with(MockClassifier::failing("connection refused"), MockLlm::keywords());
    let payload = json!({ "message": "hello", "role": "Sender", "history": [] });
    let (status, v) = send(app, post_json("/deberta/process", payload)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "upstream_error");
    assert!(v["message"]
        .as_str()
        .expect("message")
        .contains("connection refused"));
    assert!(v.get("raw").is_none());
}

#[tokio::test]
async fn reset_always_ok_with_or_without_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/deberta/reset")
        .body(Body::empty())
        .expect("build POST");
    let (status, v) = send(test_router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
    assert!(v["message"].as_str().expect("message").contains("reset"));

    let (status, v) = send(
        test_router(),
        post_json("/deberta/reset", json!({ "history": [{ "role": "Sender", "text": "x" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn invoke_returns_verdict_with_metadata() {
    let payload = json!({
        "input": {
            "conversation": "SENDER: 'Sorry, wrong number'\nRECEIVER: 'no worries'\nSENDER: 'You seem nice, add me on WhatsApp?'",
            "frequency": 250
        }
    });
    let (status, v) = send(test_router(), post_json("/api/mistral/invoke", payload)).await;
    assert_eq!(status, StatusCode::OK, "body: {v}");
    assert_eq!(v["output"]["label"], "SCAM");
    let tactics = v["output"]["tactics"].as_array().expect("tactics");
    assert!(tactics.contains(&json!("wrong_number_intro")));
    assert!(tactics.contains(&json!("channel_shifting_proposal")));
    assert_eq!(v["metadata"]["model"], "mock");
}

#[tokio::test]
async fn batch_preserves_input_order() {
    let payload = json!({
        "inputs": [
            { "conversation": "SENDER: 'Lunch at noon?'", "frequency": 1 },
            { "conversation": "SENDER: 'Invest in crypto with me, then move to Telegram'", "frequency": 3 }
        ]
    });
    let (status, v) = send(test_router(), post_json("/api/mistral/batch", payload)).await;
    assert_eq!(status, StatusCode::OK, "body: {v}");
    let out = v["output"].as_array().expect("output array");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["label"], "BENIGN");
    assert_eq!(out[1]["label"], "SCAM");
}

#[tokio::test]
async fn unparseable_llm_reply_is_parse_error_with_raw() {
    let app = router_with(
        MockClassifier::keywords(),
        MockLlm::fixed("I think this is probably a scam."),
    );
    let payload = json!({ "input": { "conversation": "SENDER: 'hi'", "frequency": 0 } });
    let (status, v) = send(app, post_json("/api/mistral/invoke", payload)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "parse_error");
    assert_eq!(v["raw"], "I think this is probably a scam.");
}

#[tokio::test]
async fn off_schema_llm_reply_is_schema_violation() {
    let reply = r#"{"label":"MAYBE","confidence":0.5,"tactics":[]}"#;
    let app = router_with(MockClassifier::keywords(), MockLlm::fixed(reply));
    let payload = json!({ "input": { "conversation": "SENDER: 'hi'", "frequency": 0 } });
    let (status, v) = send(app, post_json("/api/mistral/invoke", payload)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "schema_violation");
    assert_eq!(v["raw"], reply);
}

#[tokio::test]
async fn batch_fails_on_first_bad_reply() {
    let app = router_with(MockClassifier::keywords(), MockLlm::fixed(r#"{"label":"SCAM"}"#));
    let payload = json!({
        "inputs": [
            { "conversation": "SENDER: 'a'", "frequency": 0 },
            { "conversation": "SENDER: 'b'", "frequency": 0 }
        ]
    });
    let (status, v) = send(app, post_json("/api/mistral/batch", payload)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "schema_violation");
}

#[tokio::test]
async fn llm_outage_is_upstream_error() {
    let app = router_with(MockClassifier::keywords(), MockLlm::failing("ollama down"));
    let payload = json!({ "input": { "conversation": "SENDER: 'hi'", "frequency": 0 } });
    let (status, v) = send(app, post_json("/api/mistral/invoke", payload)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"], "upstream_error");
}

#[tokio::test]
async fn schemas_describe_input_and_output() {
    let (status, input) = send(test_router(), get("/api/mistral/input_schema")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(input["properties"]["conversation"].is_object());
    assert!(input["properties"]["frequency"].is_object());

    let (status, output) = send(test_router(), get("/api/mistral/output_schema")).await;
    assert_eq!(status, StatusCode::OK);
    for key in ["label", "confidence", "tactics"] {
        assert!(output["properties"][key].is_object(), "missing {key}");
    }
}
