//! HTTP binding for the generator.
//!
//! `POST /generate-qr` and `POST /api/generate-qr` accept a JSON body and
//! answer with `{ "imageUrl": ... }` or `{ "error": ... }`. Every other path
//! is served from the static directory.

pub mod config;
pub mod handler;
pub mod telemetry;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::encoder::QrEncoder;
use crate::generator::Generator;
use config::ServerConfig;

/// State shared by every request. Holds no mutable data.
#[derive(Debug, Clone)]
pub struct AppState {
    pub generator: Generator,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let encoder = QrEncoder::new(config.max_width);
        Self::new(Generator::new(Arc::new(encoder), config.encode_timeout))
    }
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: impl Into<std::path::PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/generate-qr", generate_route())
        .route("/api/generate-qr", generate_route())
        .fallback_service(ServeDir::new(static_dir.into()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn generate_route() -> MethodRouter<AppState> {
    post(handler::generate_qr)
        .options(handler::options)
        .fallback(handler::method_not_allowed)
}
