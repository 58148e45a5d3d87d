use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::encoder::DEFAULT_MAX_WIDTH;
use crate::error::ConfigError;

/// Runtime configuration for the `qirust-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first), with defaults
/// suitable for local use.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qirust-server",
    version,
    about = "An HTTP service that renders QR codes as PNG data URLs"
)]
pub struct CliArgs {
    /// TCP address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:3000"))]
    pub server_addr: String,

    /// Directory served for every path that is not an API route.
    ///
    /// Environment variable: `STATIC_DIR`
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Widest image, in pixels, the encoder agrees to render.
    ///
    /// Requests above this width fail with a generic encoding error instead
    /// of allocating an arbitrarily large image.
    ///
    /// Environment variable: `MAX_WIDTH`
    #[arg(long, env = "MAX_WIDTH", default_value_t = DEFAULT_MAX_WIDTH)]
    pub max_width: u32,

    /// Upper bound, in milliseconds, on a single encoding call.
    ///
    /// Environment variable: `ENCODE_TIMEOUT_MS`
    #[arg(long, env = "ENCODE_TIMEOUT_MS", default_value_t = 5_000)]
    pub encode_timeout_ms: u64,

    /// Log line format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    Compact,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub max_width: u32,
    pub encode_timeout: Duration,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_width == 0 {
            return Err(ConfigError::Zero { field: "MAX_WIDTH" });
        }

        if args.encode_timeout_ms == 0 {
            return Err(ConfigError::Zero {
                field: "ENCODE_TIMEOUT_MS",
            });
        }

        let server_addr = args
            .server_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::Address {
                addr: args.server_addr.clone(),
                source,
            })?;

        Ok(Self {
            server_addr,
            static_dir: args.static_dir,
            max_width: args.max_width,
            encode_timeout: Duration::from_millis(args.encode_timeout_ms),
            log_format: args.log_format,
        })
    }
}
