//! Integration tests for the upload gate.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_wrong_extension_is_rejected_without_artifacts() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload("/api/rotate", &[("notes.txt", b"hello".to_vec())], &[])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], "INVALID_INPUT");
    let error = response.body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid file type. Allowed:"), "{error}");
    assert!(app.uploads().is_empty());
    assert!(app.outputs().is_empty());
}

#[tokio::test]
async fn test_file_under_other_field_name_is_rejected() {
    let app = helpers::TestApp::new().await;

    let mut binary = helpers::pdf(1);
    binary.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x80]);
    let response = app
        .upload_under("/api/rotate", "document", &[("scan.pdf", binary)], &[])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_INPUT");
    assert_eq!(
        response.body["error"],
        "Unexpected file in field 'document'. Files must be sent as 'files'"
    );
    assert!(app.uploads().is_empty());
}

#[tokio::test]
async fn test_extension_check_is_case_insensitive() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload("/api/rotate", &[("SCAN.PDF", helpers::pdf(1))], &[])
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

#[tokio::test]
async fn test_missing_files() {
    let app = helpers::TestApp::new().await;

    let response = app.upload("/api/rotate", &[], &[("rotation", "90")]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Please upload a PDF file");

    let response = app
        .upload("/api/merge", &[("a.pdf", helpers::pdf(1))], &[])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Please upload at least 2 PDF files");
    assert!(app.uploads().is_empty());
}

#[tokio::test]
async fn test_too_many_files() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/compress",
            &[("a.pdf", helpers::pdf(1)), ("b.pdf", helpers::pdf(1))],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Too many files. Maximum is 1");
    assert!(app.uploads().is_empty());
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let app = helpers::TestApp::with_config(|config| {
        config.storage.max_upload_size_mb = 1;
    })
    .await;

    let big = vec![b'%'; 2 * 1024 * 1024];
    let response = app.upload("/api/compress", &[("big.pdf", big)], &[]).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.uploads().is_empty());
}

#[tokio::test]
async fn test_invalid_options_remove_inputs() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/rotate",
            &[("doc.pdf", helpers::pdf(2))],
            &[("rotation", "45")],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_INPUT");
    assert!(app.uploads().is_empty());
    assert!(app.outputs().is_empty());
}

#[tokio::test]
async fn test_unknown_operation() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload("/api/pdf-to-midi", &[("a.pdf", helpers::pdf(1))], &[])
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_html_to_pdf_rejects_missing_url() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("POST", "/api/html-to-pdf", Some(serde_json::json!({})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Please provide a URL");

    let response = app
        .request(
            "POST",
            "/api/html-to-pdf",
            Some(serde_json::json!({ "url": "ftp://example.com/file" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
