use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::AppState;
use crate::error::FailureKind;
use crate::generator::GenerationResult;
use crate::request::normalize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP status for each failure kind.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::MissingContent => StatusCode::BAD_REQUEST,
        FailureKind::TransportMismatch => StatusCode::METHOD_NOT_ALLOWED,
        FailureKind::EncodingFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GenerationResult {
    fn into_response(self) -> Response {
        match self {
            GenerationResult::Image { data_url } => (
                StatusCode::OK,
                Json(ImageResponse {
                    image_url: data_url,
                }),
            )
                .into_response(),
            GenerationResult::Failure { kind, message } => {
                (status_for(kind), Json(ErrorResponse { error: message })).into_response()
            }
        }
    }
}

/// `POST` handler. The body is parsed leniently: anything that is not JSON
/// is read as an empty mapping and fails on the missing `content` field.
///
/// A body that cannot be buffered (over the size limit, or a broken stream)
/// is an `EncodingFailed`: nothing that large fits in a symbol.
pub async fn generate_qr(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> GenerationResult {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Error reading generation request body"
            );
            return GenerationResult::failure(FailureKind::EncodingFailed);
        }
    };
    let raw = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);

    match normalize(&raw) {
        Ok(request) => state.generator.generate(request).await,
        Err(err) => {
            tracing::info!(kind = %err.kind, "rejected generation request");
            err.into()
        }
    }
}

/// Plain `OPTIONS` requests. Preflights are answered by the CORS layer.
pub async fn options() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> GenerationResult {
    GenerationResult::failure(FailureKind::TransportMismatch)
}
