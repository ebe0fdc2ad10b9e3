//! Integration tests for output download and deletion.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_download_then_delete_is_idempotent() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload("/api/watermark", &[("memo.pdf", helpers::pdf(1))], &[("text", "DRAFT")])
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let path = response.download_path();
    let name = path.trim_start_matches("/outputs/").to_string();

    let download = app.request("GET", &path, None).await;
    assert_eq!(download.status, StatusCode::OK);
    assert!(download.bytes.starts_with(b"%PDF"));

    let first = app
        .request("DELETE", &format!("/api/outputs/{name}"), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["success"], true);
    assert_eq!(first.body["deleted"], true);
    assert!(app.outputs().is_empty());

    let second = app
        .request("DELETE", &format!("/api/outputs/{name}"), None)
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["deleted"], false);

    let gone = app.request("GET", &path, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_rejects_unsafe_names() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("DELETE", "/api/outputs/..%2Fuploads", None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_output_names_are_unique() {
    let app = helpers::TestApp::new().await;

    let mut names = Vec::new();
    for _ in 0..3 {
        let response = app
            .upload("/api/rotate", &[("same.pdf", helpers::pdf(1))], &[])
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        assert_eq!(response.body["filename"], "same.pdf");
        names.push(response.download_path());
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
    assert_eq!(app.outputs().len(), 3);
}
