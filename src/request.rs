//! Request normalization.
//!
//! Turns the untyped mapping received at the transport boundary into a fully
//! populated [`GenerationRequest`]. Only a missing `content` field rejects a
//! request; every optional field that is absent or cannot be read for its
//! domain takes its default instead.

use serde_json::{Map, Value};

use crate::encoder::QrCodeEcc;
use crate::error::ValidationError;

/// Dark module color used when the request does not name one.
pub const DEFAULT_FOREGROUND: &str = "#000000";
/// Light module color used when the request does not name one.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
/// Output width used when the request carries no usable size.
pub const DEFAULT_PIXEL_SIZE: u32 = 256;
/// Error correction level used when the request does not name one.
pub const DEFAULT_ERROR_CORRECTION: QrCodeEcc = QrCodeEcc::Medium;

/// A request whose every field holds a concrete value.
///
/// Built by [`normalize`], or directly through [`GenerationRequest::new`] and
/// the `with_*` setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Text payload to encode. Never empty or whitespace-only after
    /// normalization.
    pub content: String,
    /// Color specification for dark modules.
    pub foreground_color: String,
    /// Color specification for light modules.
    pub background_color: String,
    /// Requested output width in pixels. Always positive.
    pub pixel_size: u32,
    pub error_correction: QrCodeEcc,
}

impl GenerationRequest {
    /// Creates a request for `content` with every option at its default.
    ///
    /// # Example
    ///
    /// ```
    /// use qirust_server::request::{GenerationRequest, DEFAULT_PIXEL_SIZE};
    ///
    /// let request = GenerationRequest::new("https://example.com");
    /// assert_eq!(request.pixel_size, DEFAULT_PIXEL_SIZE);
    /// assert_eq!(request.foreground_color, "#000000");
    /// ```
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            foreground_color: DEFAULT_FOREGROUND.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            error_correction: DEFAULT_ERROR_CORRECTION,
        }
    }

    pub fn with_colors(
        mut self,
        foreground: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        self.foreground_color = foreground.into();
        self.background_color = background.into();
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_error_correction(mut self, ecc: QrCodeEcc) -> Self {
        self.error_correction = ecc;
        self
    }
}

/// Validates and defaults a raw request.
///
/// The wire field names are `content`, `color`, `bgColor`, `size` and
/// `errorCorrection`. A `raw` value that is not a JSON object is read as an
/// object with no fields.
///
/// # Arguments
///
/// * `raw` - The request body as parsed at the transport boundary.
///
/// # Errors
///
/// Returns a [`ValidationError`] of kind `MissingContent` when `content` is
/// absent, not a string, empty, or whitespace-only.
///
/// # Example
///
/// ```
/// use qirust_server::request::normalize;
/// use serde_json::json;
///
/// let request = normalize(&json!({ "content": "x", "size": "not-a-number" })).unwrap();
/// assert_eq!(request.pixel_size, 256);
///
/// assert!(normalize(&json!({})).is_err());
/// ```
pub fn normalize(raw: &Value) -> Result<GenerationRequest, ValidationError> {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    let content = match fields.get("content") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        _ => return Err(ValidationError::missing_content()),
    };

    Ok(GenerationRequest {
        content,
        foreground_color: color_or(fields.get("color"), DEFAULT_FOREGROUND),
        background_color: color_or(fields.get("bgColor"), DEFAULT_BACKGROUND),
        pixel_size: fields
            .get("size")
            .and_then(parse_pixel_size)
            .unwrap_or(DEFAULT_PIXEL_SIZE),
        error_correction: fields
            .get("errorCorrection")
            .and_then(Value::as_str)
            .and_then(QrCodeEcc::from_name)
            .unwrap_or(DEFAULT_ERROR_CORRECTION),
    })
}

fn color_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(color)) if !color.is_empty() => color.clone(),
        _ => default.to_string(),
    }
}

/// Reads a size the way a lenient integer parse would. Returns `None` for
/// anything that does not yield a positive integer.
fn parse_pixel_size(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                positive(n)
            } else if number.is_i64() {
                None
            } else {
                // Truncates toward zero and saturates at u32::MAX.
                number
                    .as_f64()
                    .filter(|n| n.is_finite() && *n >= 1.0)
                    .map(|n| n as u32)
            }
        }
        Value::String(text) => parse_leading_integer(text),
        _ => None,
    }
}

/// Parses an optional sign followed by decimal digits at the start of `text`,
/// ignoring leading whitespace and anything after the digits.
fn parse_leading_integer(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() || negative {
        return None;
    }

    // Overflowing values saturate so the encoder can reject them by size.
    let n = digits.parse::<u64>().unwrap_or(u64::MAX);
    positive(n)
}

fn positive(n: u64) -> Option<u32> {
    if n == 0 {
        None
    } else {
        Some(u32::try_from(n).unwrap_or(u32::MAX))
    }
}
