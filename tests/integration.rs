// End-to-end tests exercising the full pipeline:
// request → handler → upstream client → filtering relay → response stream
//
// Uses wiremock as the upstream, tower::ServiceExt::oneshot for in-process
// HTTP, and the real reqwest-backed client (no mocks except the HTTP target).

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adrelay::config::Config;
use adrelay::proxy::{build_router, AppState};
use adrelay::upstream::PollinationsClient;

fn app_for(target_url: &str) -> axum::Router {
    let config = Config {
        target_url: target_url.to_string(),
        port: 0,
    };
    build_router(AppState {
        upstream: Arc::new(PollinationsClient::new(&config)),
        target_url: config.target_url.clone(),
    })
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

const CLEAN_SSE: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n\
                         data: [DONE]\n\n";

#[tokio::test]
async fn relays_a_clean_stream_byte_for_byte() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai"))
        .and(header_matcher("origin", "https://ish.junioralive.in"))
        .and(body_partial_json(serde_json::json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CLEAN_SSE, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&format!("{}/openai", server.uri()));
    let response = app
        .oneshot(chat_request(
            r#"{"model":"gpt-x","messages":[{"role":"user","content":"hi"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    assert_eq!(body.as_ref(), CLEAN_SSE.as_bytes());
}

#[tokio::test]
async fn stream_flag_is_forced_true_on_the_wire() {
    let server = MockServer::start().await;
    // The mock only matches stream:true; a request that kept the caller's
    // stream:false would miss it and come back as an error envelope.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw("data: ok\n\n", "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let response = app
        .oneshot(chat_request(
            r#"{"model":"gpt-x","messages":[],"stream":false}"#,
        ))
        .await
        .unwrap();

    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    assert_eq!(body.as_ref(), b"data: ok\n\n");
}

#[tokio::test]
async fn sponsored_body_is_withheld_from_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Sponsor: buy now\"}}]}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let response = app
        .oneshot(chat_request(r#"{"model":"gpt-x","messages":[]}"#))
        .await
        .unwrap();

    // The stream simply ends: 200, no data, no error envelope.
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn upstream_error_status_becomes_an_in_stream_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let response = app
        .oneshot(chat_request(r#"{"model":"gpt-x","messages":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let text = std::str::from_utf8(&body).unwrap();
    let json: serde_json::Value = serde_json::from_str(
        text.strip_prefix("data: ")
            .and_then(|t| t.strip_suffix("\n\n"))
            .expect("single SSE data event"),
    )
    .unwrap();
    assert_eq!(json["error"]["type"], "upstream_error");
    assert_eq!(json["error"]["message"], "Upstream API error: 503");
    assert_eq!(json["error"]["details"], "overloaded");
}

#[tokio::test]
async fn malformed_request_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let response = app
        .oneshot(chat_request("{\"model\": oops"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["type"], "request_error");
}
