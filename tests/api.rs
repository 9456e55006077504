//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;
use voiceos_gateway::api::{self, ApiState};
use voiceos_gateway::{Config, Gateway};

/// Build a test API router
fn build_test_router() -> axum::Router {
    let gateway = Gateway::new(Config::default()).unwrap();
    api::router(Arc::new(ApiState {
        gateway: Arc::new(gateway),
    }))
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_process_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json(
            "/process",
            &serde_json::json!({"query": "帮我把灯调成看书模式，放巴赫"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["result"]["succeeded"], 2);
    assert_eq!(json["result"]["outputs"][0]["status"], "succeeded");
    assert_eq!(json["routing"]["complexity"], "simple");
    assert!(json["execution_time_ms"].is_number());
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_process_rejects_empty_query() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json("/process", &serde_json::json!({"query": "  "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_route_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json(
            "/route",
            &serde_json::json!({"query": "周末去露营，帮我规划一下"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["complexity"], "complex");
    assert_eq!(json["backend"], "cloud-large");
}

#[tokio::test]
async fn test_register_then_list_tools() {
    let app = build_test_router();

    let response = app
        .clone()
        .oneshot(post_json(
            "/register_tool",
            &serde_json::json!({
                "name": "weather.lookup",
                "schema": {"type": "object", "properties": {"city": {"type": "string"}}}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["tool"], "weather.lookup");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/tools")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    let tools = json["tools"].as_array().unwrap();
    let weather = tools
        .iter()
        .find(|t| t["name"] == "weather.lookup")
        .unwrap();
    assert_eq!(weather["schema"]["properties"]["city"]["type"], "string");
    assert!(tools.iter().any(|t| t["name"] == "get_time"));
}

#[tokio::test]
async fn test_register_rejects_empty_name() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json("/register_tool", &serde_json::json!({"name": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
