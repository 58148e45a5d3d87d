use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use qirust_server::encoder::{EncodeOptions, QrEncoder, SymbolEncoder};
use qirust_server::error::EncodeError;
use qirust_server::generator::Generator;
use qirust_server::server::{router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Wraps the real encoder and counts how often it is reached.
#[derive(Default)]
struct CountingEncoder {
    inner: QrEncoder,
    calls: AtomicUsize,
}

impl SymbolEncoder for CountingEncoder {
    fn encode(&self, payload: &str, options: &EncodeOptions) -> Result<String, EncodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.encode(payload, options)
    }
}

struct TestApp {
    app: Router,
    encoder: Arc<CountingEncoder>,
    _static_dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("index.html"), "<h1>QR</h1>").unwrap();

        let encoder = Arc::new(CountingEncoder::default());
        let generator = Generator::new(encoder.clone(), Duration::from_secs(5));
        let app = router(AppState::new(generator), static_dir.path());

        Self {
            app,
            encoder,
            _static_dir: static_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, path: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    fn encoder_calls(&self) -> usize {
        self.encoder.calls.load(Ordering::SeqCst)
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn decode_png(data_url: &str) -> image::RgbaImage {
    let payload = data_url
        .strip_prefix("data:image/png;base64,")
        .expect("png data url");
    let bytes = STANDARD.decode(payload).unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

/// Reads a rendered symbol back with an independent QR reader.
fn scan(img: &image::RgbaImage) -> String {
    let gray = image::DynamicImage::ImageRgba8(img.clone()).to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        gray.width() as usize,
        gray.height() as usize,
        |x, y| gray.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    grids[0].decode().unwrap().1
}

#[tokio::test]
async fn content_only_request_returns_image() {
    let app = TestApp::new();
    let response = app
        .post_json("/generate-qr", json!({ "content": "https://example.com" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["imageUrl"].as_str().unwrap();
    assert!(body.get("error").is_none());
    let img = decode_png(url);
    assert_eq!(img.dimensions(), (256, 256));
    assert_eq!(scan(&img), "https://example.com");
}

#[tokio::test]
async fn images_scan_back_at_awkward_widths() {
    let app = TestApp::new();
    for size in [json!(40), json!("57"), json!(100), json!(1), json!("not-a-number")] {
        let response = app
            .post_json(
                "/generate-qr",
                json!({ "content": "https://example.com", "size": size }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "size: {size}");
        let body = body_json(response).await;
        let img = decode_png(body["imageUrl"].as_str().unwrap());
        assert_eq!(scan(&img), "https://example.com", "size: {size}");
    }
}

#[tokio::test]
async fn oversized_body_is_a_json_server_error() {
    let app = TestApp::new();
    let body = json!({ "content": "a".repeat(3 * 1024 * 1024) });
    let response = app.post_json("/generate-qr", body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body, json!({ "error": "Failed to generate QR code on server." }));
    assert_eq!(app.encoder_calls(), 0);
}

#[tokio::test]
async fn both_routes_generate() {
    let app = TestApp::new();
    for path in ["/generate-qr", "/api/generate-qr"] {
        let response = app.post_json(path, json!({ "content": "route" })).await;
        assert_eq!(response.status(), StatusCode::OK, "path: {path}");
    }
    assert_eq!(app.encoder_calls(), 2);
}

#[tokio::test]
async fn missing_content_is_bad_request() {
    let app = TestApp::new();
    for body in [json!({}), json!({ "content": "   " }), json!({ "size": 300 })] {
        let response = app.post_json("/generate-qr", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Content field is required." }));
    }
    assert_eq!(app.encoder_calls(), 0);
}

#[tokio::test]
async fn unparseable_body_is_treated_as_empty() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/generate-qr")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("content=hello"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.encoder_calls(), 0);
}

#[tokio::test]
async fn non_numeric_size_uses_default_width() {
    let app = TestApp::new();
    let response = app
        .post_json("/generate-qr", json!({ "content": "x", "size": "not-a-number" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let img = decode_png(body["imageUrl"].as_str().unwrap());
    assert_eq!(img.width(), 256);
}

#[tokio::test]
async fn options_are_applied() {
    let app = TestApp::new();
    let response = app
        .post_json(
            "/generate-qr",
            json!({
                "content": "colors",
                "color": "#ff0000",
                "bgColor": "#00ff00",
                "size": "120",
                "errorCorrection": "Q",
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let img = decode_png(body["imageUrl"].as_str().unwrap());
    assert_eq!(img.dimensions(), (120, 120));
    assert_eq!(img.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert!(img.pixels().any(|p| p.0 == [255, 0, 0, 255]));
}

#[tokio::test]
async fn identical_requests_yield_identical_images() {
    let app = TestApp::new();
    let body = json!({ "content": "same", "size": 200, "errorCorrection": "L" });
    let first = body_json(app.post_json("/generate-qr", body.clone()).await).await;
    let second = body_json(app.post_json("/generate-qr", body).await).await;
    assert_eq!(first["imageUrl"], second["imageUrl"]);
}

#[tokio::test]
async fn encoder_failures_are_generic_server_errors() {
    let app = TestApp::new();
    let cases = [
        json!({ "content": "a".repeat(3000) }),
        json!({ "content": "x", "color": "not-a-color" }),
        json!({ "content": "x", "size": 1_000_000 }),
    ];
    for body in cases {
        let response = app.post_json("/generate-qr", body).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Failed to generate QR code on server." }));
    }
}

#[tokio::test]
async fn unsupported_method_is_not_allowed() {
    let app = TestApp::new();
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let response = app
            .send(
                Request::builder()
                    .method(method.clone())
                    .uri("/generate-qr")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "method: {method}");
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Method Not Allowed. Use POST." }));
    }
    assert_eq!(app.encoder_calls(), 0);
}

#[tokio::test]
async fn plain_options_request_is_ok() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/generate-qr")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.encoder_calls(), 0);
}

#[tokio::test]
async fn preflight_carries_cors_headers() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/generate-qr")
                .header(header::ORIGIN, "https://elsewhere.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = TestApp::new();
    let response = app
        .send(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>QR</h1>");

    let response = app
        .send(Request::builder().uri("/missing.js").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bundled_static_dir_serves_index() {
    let app = router(
        AppState::new(Generator::default()),
        concat!(env!("CARGO_MANIFEST_DIR"), "/public"),
    );
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/api/generate-qr"));
}
