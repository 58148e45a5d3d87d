#![forbid(unsafe_code)]
//! The symbol-encoding capability.
//!
//! [`SymbolEncoder`] is the seam between the service and whatever turns a
//! payload into a scannable image. The default implementation, [`QrEncoder`],
//! builds the module matrix with the `qrcode` crate and paints it into a PNG
//! data URL through [`helper`](crate::helper).

use qrcode::{EcLevel, QrCode};

use crate::error::EncodeError;
use crate::helper::{self, Rgba8};

/// Widest image [`QrEncoder::default`] agrees to render.
pub const DEFAULT_MAX_WIDTH: u32 = 4096;

/// The error correction level.
///
/// Higher levels survive more damage to the printed symbol at the cost of
/// payload capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Looks up a level by its single-letter or full name, ignoring case.
    ///
    /// ```
    /// use qirust_server::encoder::QrCodeEcc;
    ///
    /// assert_eq!(QrCodeEcc::from_name("q"), Some(QrCodeEcc::Quartile));
    /// assert_eq!(QrCodeEcc::from_name("High"), Some(QrCodeEcc::High));
    /// assert_eq!(QrCodeEcc::from_name("X"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        use QrCodeEcc::*;
        match name.to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Low),
            "m" | "medium" => Some(Medium),
            "q" | "quartile" => Some(Quartile),
            "h" | "high" => Some(High),
            _ => None,
        }
    }

    fn ec_level(self) -> EcLevel {
        use QrCodeEcc::*;
        match self {
            Low => EcLevel::L,
            Medium => EcLevel::M,
            Quartile => EcLevel::Q,
            High => EcLevel::H,
        }
    }
}

/// Parameters handed to a [`SymbolEncoder`] alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Hex color of dark modules.
    pub dark_color: String,
    /// Hex color of light modules and the quiet zone.
    pub light_color: String,
    /// Target image width in pixels.
    pub width: u32,
    pub error_correction: QrCodeEcc,
}

/// Turns a payload into a self-contained image string.
///
/// Implementations must be stateless with respect to calls: the service
/// invokes them concurrently from the blocking thread pool.
pub trait SymbolEncoder: Send + Sync {
    /// Encodes `payload` and returns a ready-to-display data URL.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the payload does not fit the chosen
    /// level, an option is invalid, or the image cannot be produced.
    fn encode(&self, payload: &str, options: &EncodeOptions) -> Result<String, EncodeError>;
}

/// PNG data URL encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrEncoder {
    max_width: u32,
}

impl QrEncoder {
    /// Creates an encoder that rejects widths above `max_width`.
    pub const fn new(max_width: u32) -> Self {
        Self { max_width }
    }

    pub const fn max_width(&self) -> u32 {
        self.max_width
    }

    /// Builds the module matrix for `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::DataTooLong`] when the payload exceeds the
    /// capacity of the largest symbol at `ecc`.
    pub fn symbol(payload: &str, ecc: QrCodeEcc) -> Result<QrCode, EncodeError> {
        Ok(QrCode::with_error_correction_level(payload.as_bytes(), ecc.ec_level())?)
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WIDTH)
    }
}

impl SymbolEncoder for QrEncoder {
    fn encode(&self, payload: &str, options: &EncodeOptions) -> Result<String, EncodeError> {
        if options.width > self.max_width {
            return Err(EncodeError::WidthTooLarge {
                width: options.width,
                max: self.max_width,
            });
        }

        let dark = Rgba8::parse_hex(&options.dark_color)?;
        let light = Rgba8::parse_hex(&options.light_color)?;
        let code = Self::symbol(payload, options.error_correction)?;

        let img = helper::render_symbol(&code, options.width, dark, light);
        let png = helper::encode_png(&img)?;
        Ok(helper::png_data_url(&png))
    }
}
