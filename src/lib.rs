//! # qirust-server
//!
//! A small service that turns text into QR codes rendered as PNG data URLs.
//!
//! The interesting part is the contract around the encoder rather than the
//! encoder itself: which requests are accepted, how missing or malformed
//! options are defaulted, and how failures are classified before they reach a
//! client. Symbol encoding is delegated to the `qrcode` crate behind the
//! [`encoder::SymbolEncoder`] trait.
//!
//! ## Features
//!
//! - Lenient request normalization: only `content` is required.
//! - Four error correction levels: Low, Medium, Quartile, High.
//! - Custom dark/light colors in `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` form.
//! - Output images sized to the requested width, with a 4-module quiet zone.
//! - Encoder errors are logged and never returned to clients.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Example
//!
//! Normalize a raw request and render it:
//!
//! ```rust
//! use qirust_server::generator::{GenerationResult, Generator};
//! use qirust_server::request::normalize;
//! use serde_json::json;
//!
//! let request = normalize(&json!({
//!     "content": "https://example.com",
//!     "color": "#ff6600",
//!     "errorCorrection": "H",
//! }))
//! .unwrap();
//!
//! match Generator::default().generate_blocking(request) {
//!     GenerationResult::Image { data_url } => assert!(data_url.starts_with("data:image/png")),
//!     GenerationResult::Failure { message, .. } => panic!("{message}"),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`request`]: Validation and defaulting of incoming requests.
//! - [`generator`]: Dispatch to the encoder and mapping of its outcome.
//! - [`encoder`]: The encoding capability and its `qrcode`-backed implementation.
//! - [`helper`]: Rendering of module matrices into PNG data URLs.
//! - [`server`]: The HTTP binding, configuration and logging.

pub mod encoder;
pub mod error;
pub mod generator;
pub mod helper;
pub mod request;
pub mod server;
