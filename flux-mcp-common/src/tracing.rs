//! Tracing initialization for the Flux MCP server.
//!
//! Logs always go to stderr: with the stdio transport, stdout carries the MCP
//! protocol stream and any stray log line there would corrupt it.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=flux_mcp_image=debug` - Poll attempts and backoff delays
//!   - `RUST_LOG=warn,flux_mcp_common=debug` - Warn by default, debug for common

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the tracing subscriber, falling back to `default_level` when
/// `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber is already installed. Use
/// [`try_init_tracing`] where initialization may happen more than once.
///
/// # Example
///
/// ```no_run
/// use flux_mcp_common::tracing::init_tracing;
///
/// init_tracing("info");
/// tracing::info!("Server starting");
/// ```
pub fn init_tracing(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize tracing, returning an error if already initialized.
///
/// # Example
///
/// ```
/// use flux_mcp_common::tracing::try_init_tracing;
///
/// // Ok(()) or Err(()) depending on prior initialization
/// let _ = try_init_tracing("info");
/// ```
pub fn try_init_tracing(default_level: &str) -> Result<(), ()> {
    subscriber(default_level).try_init().map_err(|_| ())
}

fn subscriber(default_level: &str) -> impl SubscriberInitExt {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer)
}
