//! End-to-end tests for the HTTP API, driven through the router with a fake converter.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pdf_converter::{
    converter::{ConvertError, ConverterStatus, DocumentConverter},
    create_router, AppState, Config,
};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "pdf-converter-test-boundary";

/// Stands in for LibreOffice: writes `%PDF-1.4 <input name>` next to the input stem.
struct FakeConverter {
    available: bool,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl DocumentConverter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        if !self.available {
            return Err(ConvertError::Unavailable("fake-soffice: not found".into()));
        }
        let file_name = input.file_name().unwrap().to_string_lossy().to_string();
        if self.fail_on == Some(file_name.as_str()) {
            return Err(ConvertError::Failed {
                code: 1,
                stderr: "Error: source file could not be loaded".into(),
            });
        }
        let stem = input.file_stem().unwrap().to_string_lossy().to_string();
        let pdf = out_dir.join(format!("{}.pdf", stem));
        tokio::fs::write(&pdf, format!("%PDF-1.4 {}", file_name)).await?;
        Ok(pdf)
    }

    async fn status(&self) -> ConverterStatus {
        ConverterStatus {
            name: "fake".into(),
            available: self.available,
            version: self.available.then(|| "Fake 1.0".to_string()),
            detail: (!self.available).then(|| "fake-soffice: not found".to_string()),
        }
    }
}

struct TestApp {
    router: Router,
    upload_dir: PathBuf,
    _temp: TempDir,
}

fn test_app_with(converter: FakeConverter, overrides: &[(&str, &str)]) -> TestApp {
    let temp = TempDir::new().unwrap();
    let upload_dir = temp.path().join("uploads");

    let mut vars: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.insert("UPLOAD_DIR".into(), upload_dir.to_string_lossy().to_string());

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = AppState::with_converter(config, Arc::new(converter));

    TestApp {
        router: create_router(state),
        upload_dir,
        _temp: temp,
    }
}

fn test_app() -> TestApp {
    test_app_with(
        FakeConverter {
            available: true,
            fail_on: None,
        },
        &[],
    )
}

/// One part of a multipart body; `file_name: None` makes a plain text field.
struct Part {
    field: String,
    file_name: Option<String>,
    content: Vec<u8>,
}

fn file_part(field: &str, file_name: &str, content: &[u8]) -> Part {
    Part {
        field: field.to_string(),
        file_name: Some(file_name.to_string()),
        content: content.to_vec(),
    }
}

fn text_part(field: &str, value: &str) -> Part {
    Part {
        field: field.to_string(),
        file_name: None,
        content: value.as_bytes().to_vec(),
    }
}

fn multipart_request(parts: Vec<Part>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match &part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        part.field, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.field)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post("/api/files/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn assert_upload_dir_empty(app: &TestApp) {
    let leftovers = std::fs::read_dir(&app.upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0, "temporary files left behind");
}

#[tokio::test]
async fn single_upload_returns_pdf() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![file_part("files", "report.docx", b"fake docx")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(response.headers()["x-converted-count"], "1");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename=\"report_converted.pdf\""));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    assert_eq!(body_bytes(response).await, b"%PDF-1.4 report.docx");
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn multiple_uploads_return_zip() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![
            file_part("files", "budget.xlsx", b"x"),
            text_part("note", "ignored text field"),
            file_part("files", "slides.pptx", b"y"),
            file_part("files", "budget.ods", b"z"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(response.headers()["x-converted-count"], "3");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("filename=\"converted_files.zip\""));

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "budget_converted.pdf",
            "slides_converted.pdf",
            "budget_converted_2.pdf",
        ]
    );

    let mut slides = String::new();
    archive
        .by_name("slides_converted.pdf")
        .unwrap()
        .read_to_string(&mut slides)
        .unwrap();
    assert_eq!(slides, "%PDF-1.4 slides.pptx");

    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn no_files_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![text_part("note", "just text")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No files uploaded");
    assert_eq!(json["status"], 400);
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn unexpected_file_field_is_rejected() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![file_part("document", "a.docx", b"x")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Unexpected field: document");
}

#[tokio::test]
async fn non_multipart_body_is_json_error() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/files/convert")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(json["status"], 400);
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn too_many_files_is_rejected() {
    let app = test_app_with(
        FakeConverter {
            available: true,
            fail_on: None,
        },
        &[("MAX_FILES", "2")],
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![
            file_part("files", "a.docx", b"a"),
            file_part("files", "b.docx", b"b"),
            file_part("files", "c.docx", b"c"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let app = test_app_with(
        FakeConverter {
            available: true,
            fail_on: None,
        },
        &[("MAX_FILE_BYTES", "8")],
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![file_part(
            "files",
            "huge.docx",
            b"definitely more than eight bytes",
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["status"], 413);
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn conversion_failure_reports_file_and_cleans_up() {
    let app = test_app_with(
        FakeConverter {
            available: true,
            fail_on: Some("broken.docx"),
        },
        &[],
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![
            file_part("files", "fine.docx", b"x"),
            file_part("files", "broken.docx", b"y"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Failed to convert broken.docx");
    assert_eq!(json["details"], "Converter exited with code 1");
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn missing_converter_is_service_unavailable() {
    let app = test_app_with(
        FakeConverter {
            available: false,
            fail_on: None,
        },
        &[],
    );

    let response = app
        .router
        .clone()
        .oneshot(multipart_request(vec![file_part("files", "a.docx", b"x")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_upload_dir_empty(&app);
}

#[tokio::test]
async fn health_reports_converter() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["converter"]["name"], "fake");
    assert_eq!(json["converter"]["available"], true);
    assert_eq!(json["converter"]["version"], "Fake 1.0");
    assert!(json["converter"]["detail"].is_null());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn health_degraded_without_converter() {
    let app = test_app_with(
        FakeConverter {
            available: false,
            fail_on: None,
        },
        &[],
    );

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["converter"]["available"], false);
    // Unset fields are present as null so clients see a stable shape
    assert!(json["converter"].get("version").is_some());
    assert!(json["converter"]["version"].is_null());
    assert_eq!(json["converter"]["detail"], "fake-soffice: not found");
}

#[tokio::test]
async fn cors_exposes_download_headers() {
    let app = test_app_with(
        FakeConverter {
            available: true,
            fail_on: None,
        },
        &[("CORS_ORIGIN", "http://localhost:5173")],
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/files/convert")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
                .body(Body::from(format!("--{}--\r\n", BOUNDARY)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    let exposed = response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
        .to_str()
        .unwrap()
        .to_lowercase();
    assert!(exposed.contains("content-disposition"));
    assert!(exposed.contains("x-converted-count"));
}
