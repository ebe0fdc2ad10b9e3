//! Integration tests for operation endpoints.

mod helpers;

use std::io::Cursor;

use http::StatusCode;

#[tokio::test]
async fn test_merge_concatenates_in_upload_order() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/merge",
            &[
                ("first.pdf", helpers::pdf_with_widths(&[100.0])),
                ("second.pdf", helpers::pdf_with_widths(&[200.0, 300.0])),
            ],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["filename"], "merged.pdf");
    let url = response.body["downloadUrl"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:5000/outputs/"), "{url}");

    let download = app
        .request("GET", &response.download_path(), None)
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(response.body["size"], download.bytes.len() as u64);
    assert_eq!(helpers::widths(&download.bytes), vec![100.0, 200.0, 300.0]);

    assert!(app.uploads().is_empty());
    assert_eq!(app.outputs().len(), 1);
}

#[tokio::test]
async fn test_split_every_n_pages_bundles_zip() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/split",
            &[("report.pdf", helpers::pdf(5))],
            &[("splitMode", "every"), ("everyN", "2")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["filename"], "split_pages.zip");

    let download = app
        .request("GET", &response.download_path(), None)
        .await;
    let mut archive = zip::ZipArchive::new(Cursor::new(download.bytes)).unwrap();
    assert_eq!(archive.len(), 3);
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["page_1.pdf", "page_2.pdf", "page_3.pdf"]);
}

#[tokio::test]
async fn test_split_range_yields_single_pdf() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/split",
            &[(
                "report.pdf",
                helpers::pdf_with_widths(&[100.0, 200.0, 300.0, 400.0, 500.0]),
            )],
            &[("splitMode", "range"), ("pageRange", "2,4-5")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["filename"], "split.pdf");
    let download = app
        .request("GET", &response.download_path(), None)
        .await;
    assert_eq!(helpers::widths(&download.bytes), vec![200.0, 400.0, 500.0]);
}

#[tokio::test]
async fn test_split_range_out_of_bounds() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/split",
            &[("report.pdf", helpers::pdf(3))],
            &[("splitMode", "range"), ("pageRange", "7-9")],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.uploads().is_empty());
    assert!(app.outputs().is_empty());
}

#[tokio::test]
async fn test_rotate_sets_page_rotation() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/rotate",
            &[("scan.pdf", helpers::pdf(2))],
            &[("rotation", "180"), ("pages", "even")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["filename"], "scan.pdf");

    let download = app
        .request("GET", &response.download_path(), None)
        .await;
    let doc = lopdf::Document::load_mem(&download.bytes).unwrap();
    let rotations: Vec<i64> = doc
        .get_pages()
        .values()
        .map(|id| {
            doc.get_dictionary(*id)
                .unwrap()
                .get(b"Rotate")
                .and_then(|r| r.as_i64())
                .unwrap_or(0)
        })
        .collect();
    assert_eq!(rotations, vec![0, 180]);
}

#[tokio::test]
async fn test_compress_reports_sizes() {
    let app = helpers::TestApp::new().await;
    let source = helpers::pdf(3);
    let original = source.len() as u64;

    let response = app
        .upload("/api/compress", &[("big.pdf", source)], &[])
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["originalSize"], original);
    assert_eq!(response.body["compressedSize"], response.body["size"]);
    assert!(response.body["reduction"].as_str().unwrap().ends_with('%'));
}

#[tokio::test]
async fn test_protect_then_unlock() {
    let app = helpers::TestApp::new().await;

    let protected = app
        .upload(
            "/api/protect",
            &[("secret.pdf", helpers::pdf(1))],
            &[("password", "hunter2")],
        )
        .await;
    assert_eq!(protected.status, StatusCode::OK, "{:?}", protected.body);
    let locked = app
        .request("GET", &protected.download_path(), None)
        .await
        .bytes;

    let wrong = app
        .upload(
            "/api/unlock",
            &[("secret.pdf", locked.clone())],
            &[("password", "letmein")],
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.body["code"], "AUTHENTICATION_ERROR");
    assert_eq!(wrong.body["error"], "Incorrect password");
    assert!(app.uploads().is_empty());

    let right = app
        .upload(
            "/api/unlock",
            &[("secret.pdf", locked)],
            &[("password", "hunter2")],
        )
        .await;
    assert_eq!(right.status, StatusCode::OK, "{:?}", right.body);
}

#[tokio::test]
async fn test_protect_requires_password() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload("/api/protect", &[("secret.pdf", helpers::pdf(1))], &[])
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Password is required");
}

#[tokio::test]
async fn test_corrupt_pdf_is_processing_error() {
    let app = helpers::TestApp::new().await;

    let response = app
        .upload(
            "/api/watermark",
            &[("broken.pdf", b"%PDF-1.4 garbage".to_vec())],
            &[],
        )
        .await;

    assert!(
        response.status == StatusCode::BAD_REQUEST
            || response.status == StatusCode::INTERNAL_SERVER_ERROR,
        "{}",
        response.status
    );
    assert_eq!(response.body["success"], false);
    assert!(app.uploads().is_empty());
    assert!(app.outputs().is_empty());
}

#[tokio::test]
async fn test_public_base_url_in_download_links() {
    let app = helpers::TestApp::with_config(|config| {
        config.server.public_base_url = Some("https://pdf.example.com".to_string());
    })
    .await;

    let response = app
        .upload("/api/page-numbers", &[("doc.pdf", helpers::pdf(2))], &[])
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let url = response.body["downloadUrl"].as_str().unwrap();
    assert!(url.starts_with("https://pdf.example.com/outputs/"), "{url}");
}
