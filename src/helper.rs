use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};
use qrcode::{Color, QrCode};

use crate::error::EncodeError;

/*---- Utilities ----*/

/// Light modules drawn around the symbol on every side.
pub const QUIET_ZONE: u32 = 4;

/// Pixels per module when the requested width is too small for the symbol.
pub const FALLBACK_SCALE: u32 = 4;

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8([0, 0, 0, 255]);
    pub const WHITE: Rgba8 = Rgba8([255, 255, 255, 255]);

    /// Parses `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`. The leading `#` is
    /// optional and digits are case-insensitive. Colors without an alpha
    /// component are opaque.
    ///
    /// # Example
    ///
    /// ```
    /// use qirust_server::helper::Rgba8;
    ///
    /// assert_eq!(Rgba8::parse_hex("#f00").unwrap(), Rgba8([255, 0, 0, 255]));
    /// assert_eq!(Rgba8::parse_hex("00ff0080").unwrap(), Rgba8([0, 255, 0, 128]));
    /// assert!(Rgba8::parse_hex("#12345").is_err());
    /// ```
    pub fn parse_hex(value: &str) -> Result<Self, EncodeError> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EncodeError::invalid_color(value));
        }

        // Short forms double every digit: "f0a" -> "ff00aa".
        let expanded: String = match hex.len() {
            3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => hex.to_string(),
            _ => return Err(EncodeError::invalid_color(value)),
        };

        let mut channels = [255u8; 4];
        for (channel, pair) in channels.iter_mut().zip(expanded.as_bytes().chunks(2)) {
            let pair =
                std::str::from_utf8(pair).map_err(|_| EncodeError::invalid_color(value))?;
            *channel =
                u8::from_str_radix(pair, 16).map_err(|_| EncodeError::invalid_color(value))?;
        }
        Ok(Rgba8(channels))
    }
}

impl From<Rgba8> for Rgba<u8> {
    fn from(color: Rgba8) -> Self {
        Rgba(color.0)
    }
}

/// Pixel geometry of a rendered symbol.
///
/// Every module is drawn as a square of exactly `scale` pixels so readers can
/// lock onto the grid. When the requested width is not a whole multiple of
/// the symbol width (quiet zone included), the leftover pixels widen the
/// quiet zone, split between both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Image width and height in pixels.
    pub side: u32,
    /// Pixels per module.
    pub scale: u32,
    /// Pixels before the first module on each axis.
    pub offset: u32,
}

impl Layout {
    /// Computes the layout for a symbol of `modules` modules per side when
    /// `requested` pixels were asked for.
    ///
    /// The requested width is honored whenever it leaves at least one pixel
    /// per module, quiet zone included; otherwise each module is drawn
    /// [`FALLBACK_SCALE`] pixels wide.
    ///
    /// # Example
    ///
    /// ```
    /// use qirust_server::helper::Layout;
    ///
    /// // Version 1: 21 modules, 29 with the quiet zone.
    /// let layout = Layout::new(21, 100);
    /// assert_eq!((layout.side, layout.scale), (100, 3));
    /// assert_eq!(layout.offset, 4 * 3 + (100 - 87) / 2);
    /// ```
    pub fn new(modules: u32, requested: u32) -> Self {
        let total = modules + 2 * QUIET_ZONE;
        if requested >= total {
            let scale = requested / total;
            let leftover = requested - scale * total;
            Self {
                side: requested,
                scale,
                offset: QUIET_ZONE * scale + leftover / 2,
            }
        } else {
            Self {
                side: total * FALLBACK_SCALE,
                scale: FALLBACK_SCALE,
                offset: QUIET_ZONE * FALLBACK_SCALE,
            }
        }
    }

    /// Maps a pixel offset to a module offset, or `None` inside the quiet
    /// zone.
    fn module_at(&self, pixel: u32, modules: u32) -> Option<usize> {
        let module = pixel.checked_sub(self.offset)? / self.scale;
        (module < modules).then_some(module as usize)
    }
}

/// Paints a QR Code into an RGBA image, quiet zone included.
///
/// # Arguments
///
/// * `code` - The symbol to draw.
/// * `requested_width` - Target width in pixels, see [`Layout::new`].
/// * `dark` - Color of dark modules.
/// * `light` - Color of light modules and the quiet zone.
pub fn render_symbol(
    code: &QrCode,
    requested_width: u32,
    dark: Rgba8,
    light: Rgba8,
) -> RgbaImage {
    let modules = code.width();
    let colors = code.to_colors();
    let layout = Layout::new(modules as u32, requested_width);

    // Pixel offset -> module offset, shared by both axes.
    let lookup: Vec<Option<usize>> = (0..layout.side)
        .map(|p| layout.module_at(p, modules as u32))
        .collect();

    let mut img = RgbaImage::new(layout.side, layout.side);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let is_dark = match (lookup[x as usize], lookup[y as usize]) {
            (Some(mx), Some(my)) => colors[my * modules + mx] == Color::Dark,
            _ => false,
        };
        *pixel = if is_dark { dark.into() } else { light.into() };
    }

    img
}

/// Encodes an image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Wraps PNG bytes in a `data:` URL.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
