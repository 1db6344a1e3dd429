//! Flux MCP Image Server Library
//!
//! This library provides text-to-image generation through the Black Forest
//! Labs Flux API: parameter normalization, job submission, completion
//! polling and result extraction, exposed as an MCP tool.

pub mod client;
pub mod handler;
pub mod params;
pub mod poller;
pub mod resources;
pub mod result;
pub mod server;
pub mod submitter;

pub use client::{Asset, FluxApi, HttpFluxClient, JobHandle, PollOutcome};
pub use handler::FluxAdapter;
pub use params::{GenerationRequest, GenerationSettings, Geometry};
pub use poller::{Clock, PollerConfig, TokioClock};
pub use result::GenerationResult;
pub use server::FluxServer;
