//! MCP Resources for the Flux server.
//!
//! This module provides resource implementations for:
//! - `flux://models` - List available Flux models
//! - `flux://aspect_ratios` - List aspect-ratio tokens and the sizes they produce

use crate::params::{ASPECT_RATIOS, DEFAULT_MODEL, geometry_for_ratio};
use flux_mcp_common::models::{FLUX_MODELS, GeometryMode, ModelRegistry};
use serde::Serialize;

/// URI of the models resource.
pub const MODELS_URI: &str = "flux://models";

/// URI of the aspect ratios resource.
pub const ASPECT_RATIOS_URI: &str = "flux://aspect_ratios";

/// Information about an available Flux model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: &'static str,
    /// Model aliases
    pub aliases: Vec<&'static str>,
    /// How the output size is chosen
    pub geometry: GeometryMode,
    /// Smallest accepted side length in pixels
    pub min_side: u32,
    /// Largest accepted side length in pixels
    pub max_side: u32,
    /// Whether the `raw` flag has an effect
    pub supports_raw: bool,
    /// Maximum prompt length in characters
    pub max_prompt_length: usize,
    /// Whether this model is used when none is given
    pub is_default: bool,
}

/// An aspect-ratio token and the size it yields on the default model.
#[derive(Debug, Clone, Serialize)]
pub struct AspectRatioInfo {
    /// Ratio token, e.g. "16:9"
    pub ratio: &'static str,
    /// Derived width in pixels
    pub width: u32,
    /// Derived height in pixels
    pub height: u32,
}

/// List all available Flux models.
pub fn list_models() -> Vec<ModelInfo> {
    FLUX_MODELS
        .iter()
        .map(|m| ModelInfo {
            id: m.id,
            aliases: m.aliases.to_vec(),
            geometry: m.geometry,
            min_side: m.min_side,
            max_side: m.max_side,
            supports_raw: m.supports_raw,
            max_prompt_length: m.max_prompt_length,
            is_default: m.id == DEFAULT_MODEL,
        })
        .collect()
}

/// List the supported aspect ratios with their default-model sizes.
pub fn list_aspect_ratios() -> Vec<AspectRatioInfo> {
    let Some(model) = ModelRegistry::resolve(DEFAULT_MODEL) else {
        return Vec::new();
    };

    ASPECT_RATIOS
        .iter()
        .copied()
        .filter_map(|ratio| {
            geometry_for_ratio(model, ratio).map(|g| AspectRatioInfo {
                ratio,
                width: g.width,
                height: g.height,
            })
        })
        .collect()
}

/// Get models resource as JSON string.
pub fn models_resource_json() -> String {
    serde_json::to_string_pretty(&list_models()).unwrap_or_else(|_| "[]".to_string())
}

/// Get aspect ratios resource as JSON string.
pub fn aspect_ratios_resource_json() -> String {
    serde_json::to_string_pretty(&list_aspect_ratios()).unwrap_or_else(|_| "[]".to_string())
}
