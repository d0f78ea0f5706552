use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use image::{GrayImage, Luma};
use partbook::adapters::api::handlers::AppStateInner;
use partbook::adapters::api::routes::create_router;
use partbook::adapters::persistence::in_memory::InMemoryScoreStore;
use partbook::config::AppConfig;
use partbook::domain::errors::CoreError;
use partbook::domain::score::Page;
use partbook::ports::raster_backend::PdfRasterBackend;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `app.oneshot()`

const PAGE_WIDTH: u32 = 1000;
const PAGE_HEIGHT: u32 = 1200;

/// Test double standing in for pdfium: ignores the PDF bytes entirely and
/// returns one fixed page with two drawn staves, so the HTTP layer can be
/// exercised without a native PDF library.
struct StubRasterBackend;

impl PdfRasterBackend for StubRasterBackend {
    fn rasterize(&self, _pdf_bytes: &[u8], _dpi: f32, _max_page_bytes: usize) -> Result<Vec<Page>, CoreError> {
        let mut raster = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
        for y in [100u32, 105, 500, 505] {
            for x in 50..(PAGE_WIDTH - 50) {
                raster.put_pixel(x, y, Luma([0]));
            }
        }
        Ok(vec![Page {
            index: 0,
            width_px: PAGE_WIDTH,
            height_px: PAGE_HEIGHT,
            raster: Arc::new(raster),
        }])
    }
}

fn setup_app() -> axum::Router {
    let score_store = Arc::new(InMemoryScoreStore::new(512 * 1024 * 1024));
    let raster_backend = Arc::new(StubRasterBackend);
    let state = Arc::new(AppStateInner::new(score_store, raster_backend, AppConfig::default()));
    create_router(state)
}

fn multipart_pdf_body(boundary: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"; filename=\"score.pdf\"\r\n");
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn upload_score(app: &axum::Router) -> Value {
    let boundary = "X-BOUNDARY-X";
    let body = multipart_pdf_body(boundary, b"%PDF-1.4\n...fake...");
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/scores")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { json!(null) } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

#[tokio::test]
async fn create_score_rasterises_and_returns_page_summaries() {
    let app = setup_app();
    let body = upload_score(&app).await;
    assert!(body["score_id"].is_string());
    assert_eq!(body["page_count"], 1);
    assert_eq!(body["pages"][0]["width_px"], PAGE_WIDTH);
    assert_eq!(body["pages"][0]["height_px"], PAGE_HEIGHT);
}

#[tokio::test]
async fn create_score_rejects_missing_file_field() {
    let app = setup_app();
    let boundary = "X-BOUNDARY-X";
    let mut empty_body = Vec::new();
    empty_body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/scores")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(empty_body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_page_raster_returns_png() {
    let app = setup_app();
    let created = upload_score(&app).await;
    let score_id = created["score_id"].as_str().unwrap();

    let (status, headers, bytes) = get(&app, &format!("/api/v1/scores/{score_id}/pages/0/raster")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/png");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn detect_returns_dividers_scaled_to_display_width() {
    let app = setup_app();
    let created = upload_score(&app).await;
    let score_id = created["score_id"].as_str().unwrap();

    let (status, _headers, bytes) =
        get(&app, &format!("/api/v1/scores/{score_id}/pages/0/detect?display_width=500")).await;
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(result["dividers"].is_array());
    assert!(result["confidence"].as_f64().unwrap() >= 0.0);
    // display_width is half of PAGE_WIDTH, so every divider Y must be halved too.
    if let Some(first) = result["dividers"].as_array().unwrap().first() {
        assert!(first.as_f64().unwrap() < PAGE_HEIGHT as f64);
    }
}

#[tokio::test]
async fn get_raster_for_unknown_score_is_not_found() {
    let app = setup_app();
    let (status, _headers, _bytes) =
        get(&app, "/api/v1/scores/00000000-0000-0000-0000-000000000000/pages/0/raster").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partition_then_generate_then_fetch_part_pdf() {
    let app = setup_app();
    let created = upload_score(&app).await;
    let score_id = created["score_id"].as_str().unwrap();

    // Two named staves in one system: a leading dead margin, a system-start
    // divider, a midpoint divider, and a closing divider that does not open
    // a new system.
    let (status, partition_body) = post_json(
        &app,
        &format!("/api/v1/scores/{score_id}/partition"),
        json!({
            "display_width": PAGE_WIDTH,
            "pages": {
                "0": {
                    "dividers": [0.0, 80.0, 520.0, 1100.0],
                    "system_flags": [false, true, false, false],
                    "strip_names": ["", "Violin I", "Viola"]
                }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let parts = partition_body["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    let names: Vec<&str> = parts.iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"Violin I"));
    assert!(names.contains(&"Viola"));

    let (status, generate_body) = post_json(
        &app,
        &format!("/api/v1/scores/{score_id}/generate"),
        json!({
            "parts": {
                "Violin I": {"spacing_mm": 5.0, "offsets": [], "page_breaks_after": []},
                "Viola": {"spacing_mm": 5.0, "offsets": [], "page_breaks_after": []}
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let generated = generate_body["parts"].as_array().unwrap();
    assert_eq!(generated.len(), 2);
    for part in generated {
        assert!(part["page_count"].as_u64().unwrap() >= 1);
    }

    let (status, headers, bytes) = get(&app, &format!("/api/v1/scores/{score_id}/parts/Violin%20I/pdf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "application/pdf");
    assert_eq!(&bytes[..5], b"%PDF-");
}

#[tokio::test]
async fn generate_before_partition_is_invalid_input() {
    let app = setup_app();
    let created = upload_score(&app).await;
    let score_id = created["score_id"].as_str().unwrap();

    let (status, _body) = post_json(
        &app,
        &format!("/api/v1/scores/{score_id}/generate"),
        json!({ "parts": {} }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
