//! Integration tests for health, tool listing and cross-cutting middleware.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    let timestamp = response.body["timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'), "not UTC: {timestamp}");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/health", None).await;

    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(
        response.headers["cross-origin-resource-policy"],
        "cross-origin"
    );
}

#[tokio::test]
async fn test_list_tools() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/tools", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    let names: Vec<&str> = response.body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for tool in ["libreoffice", "ghostscript", "chromium", "ocrmypdf"] {
        assert!(names.contains(&tool), "missing {tool} in {names:?}");
    }
}

#[tokio::test]
async fn test_rate_limit_applies_to_api_routes() {
    let app = helpers::TestApp::with_config(|config| {
        config.server.rate_limit.max_requests = 2;
    })
    .await;

    assert_eq!(app.request("GET", "/api/tools", None).await.status, StatusCode::OK);
    assert_eq!(app.request("GET", "/api/tools", None).await.status, StatusCode::OK);

    let response = app.request("GET", "/api/tools", None).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], "RATE_LIMITED");
    assert_eq!(
        response.body["error"],
        "Too many requests, please try again later."
    );

    // Health sits outside /api.
    assert_eq!(app.request("GET", "/health", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = helpers::TestApp::new().await;

    let req = http::Request::builder()
        .method("OPTIONS")
        .uri("/api/merge")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(req).await;

    assert_eq!(
        response.headers["access-control-allow-origin"],
        "http://localhost:3000"
    );
}
