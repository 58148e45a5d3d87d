//! Dispatches normalized requests to a [`SymbolEncoder`] and maps the outcome
//! onto [`GenerationResult`].
//!
//! Encoder errors never cross this boundary: they are logged through
//! `tracing` and replaced by a generic `EncodingFailed` failure. Each request
//! gets exactly one encoding attempt.

use std::sync::Arc;
use std::time::Duration;

use crate::encoder::{EncodeOptions, QrEncoder, SymbolEncoder};
use crate::error::{FailureKind, GenerateError, ValidationError};
use crate::request::GenerationRequest;

/// Default upper bound on a single encoding call.
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// A self-contained image, ready to display.
    Image { data_url: String },
    /// The request failed. `message` is safe to show to the client.
    Failure { kind: FailureKind, message: String },
}

impl GenerationResult {
    pub fn failure(kind: FailureKind) -> Self {
        GenerationResult::Failure {
            kind,
            message: kind.message().to_string(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, GenerationResult::Image { .. })
    }
}

impl From<ValidationError> for GenerationResult {
    fn from(err: ValidationError) -> Self {
        GenerationResult::Failure {
            kind: err.kind,
            message: err.message,
        }
    }
}

impl From<&GenerationRequest> for EncodeOptions {
    fn from(request: &GenerationRequest) -> Self {
        EncodeOptions {
            dark_color: request.foreground_color.clone(),
            light_color: request.background_color.clone(),
            width: request.pixel_size,
            error_correction: request.error_correction,
        }
    }
}

/// The encoder adapter. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Generator {
    encoder: Arc<dyn SymbolEncoder>,
    timeout: Duration,
}

impl Generator {
    pub fn new(encoder: Arc<dyn SymbolEncoder>, timeout: Duration) -> Self {
        Self { encoder, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Encodes `request` on the blocking thread pool.
    ///
    /// The caller suspends until the encoder finishes or the configured
    /// timeout elapses. A timed out encoding is reported as `EncodingFailed`;
    /// the worker thread is left to finish on its own.
    pub async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        let encoder = Arc::clone(&self.encoder);
        let task = tokio::task::spawn_blocking(move || encode(encoder.as_ref(), request));

        let outcome = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(encoded)) => encoded,
            Ok(Err(join)) => Err(GenerateError::Join(join)),
            Err(_elapsed) => Err(GenerateError::Timeout(self.timeout)),
        };
        into_result(outcome)
    }

    /// Encodes `request` on the current thread, without a timeout.
    pub fn generate_blocking(&self, request: GenerationRequest) -> GenerationResult {
        into_result(encode(self.encoder.as_ref(), request))
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(Arc::new(QrEncoder::default()), DEFAULT_ENCODE_TIMEOUT)
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn encode(
    encoder: &dyn SymbolEncoder,
    request: GenerationRequest,
) -> Result<String, GenerateError> {
    let options = EncodeOptions::from(&request);
    tracing::debug!(
        payload_len = request.content.len(),
        width = options.width,
        ecc = ?options.error_correction,
        "encoding symbol"
    );
    Ok(encoder.encode(&request.content, &options)?)
}

fn into_result(outcome: Result<String, GenerateError>) -> GenerationResult {
    match outcome {
        Ok(data_url) => GenerationResult::Image { data_url },
        Err(err) => {
            tracing::error!(error = %err, "Error generating QR code");
            GenerationResult::failure(FailureKind::EncodingFailed)
        }
    }
}
