//! Error types shared by the normalizer, the encoder and the generator.
//!
//! Only [`FailureKind`] and its fixed messages ever reach a client. The other
//! errors carry internal detail and are meant for the diagnostic log.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Client-visible classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The `content` field was absent, empty, or whitespace-only.
    MissingContent,
    /// The encoding capability could not produce an image.
    EncodingFailed,
    /// The request arrived with an unsupported method.
    TransportMismatch,
}

impl FailureKind {
    /// The message returned to the client for this kind.
    ///
    /// These strings are safe to show and never contain internal details.
    pub const fn message(self) -> &'static str {
        match self {
            FailureKind::MissingContent => "Content field is required.",
            FailureKind::EncodingFailed => "Failed to generate QR code on server.",
            FailureKind::TransportMismatch => "Method Not Allowed. Use POST.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::MissingContent => "missing_content",
            FailureKind::EncodingFailed => "encoding_failed",
            FailureKind::TransportMismatch => "transport_mismatch",
        };
        f.write_str(name)
    }
}

/// Returned by [`normalize`](crate::request::normalize) when a request cannot
/// be dispatched to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Machine-checkable kind.
    pub kind: FailureKind,
    /// Human-readable message, safe to surface verbatim.
    pub message: String,
}

impl ValidationError {
    /// The request carried no usable `content`.
    #[must_use]
    pub fn missing_content() -> Self {
        Self {
            kind: FailureKind::MissingContent,
            message: FailureKind::MissingContent.message().to_string(),
        }
    }
}

/// Errors raised by a [`SymbolEncoder`](crate::encoder::SymbolEncoder).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The payload does not fit any symbol version at the chosen level.
    #[error("payload cannot be encoded: {0}")]
    DataTooLong(#[from] qrcode::types::QrError),

    /// A color was not a `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` hex string.
    #[error("invalid hex color: {value:?}")]
    InvalidColor { value: String },

    /// The requested width exceeds the configured limit.
    #[error("requested width {width} exceeds the maximum of {max}")]
    WidthTooLarge { width: u32, max: u32 },

    /// PNG encoding failed.
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

impl EncodeError {
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }
}

/// Internal cause of an `EncodingFailed` outcome. Logged, never returned.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("encoding did not finish within {0:?}")]
    Timeout(Duration),

    #[error("encoding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration rejected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("invalid server address {addr:?}: {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}
