//! Flux MCP Common Library
//!
//! Shared configuration, credential handling, model definitions, error
//! taxonomy, tracing and MCP server plumbing for the Flux image server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod tracing;
pub mod transport;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod error_test;

pub use auth::ApiKey;
pub use config::Config;
pub use error::{ConfigError, Error, ErrorKind, Result};
pub use models::{FluxModel, GeometryMode, ModelRegistry};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
