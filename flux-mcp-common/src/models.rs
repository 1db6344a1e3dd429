//! Model definitions and registry for Black Forest Labs Flux models.
//!
//! This module provides static model definitions and a registry for resolving
//! model names and aliases to their full definitions.

use serde::Serialize;

/// How a model receives its output geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMode {
    /// The service takes explicit `width` and `height`
    Dimensions,
    /// The service takes an `aspect_ratio` token and picks the size itself
    AspectRatio,
}

/// Flux model definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FluxModel {
    /// Full model identifier
    pub id: &'static str,
    /// Model aliases for convenience
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    /// Path of the submission endpoint relative to the API base URL
    pub endpoint: &'static str,
    /// Whether the service wants dimensions or an aspect-ratio token
    pub geometry: GeometryMode,
    /// Approximate pixel count of an image produced from an aspect ratio
    pub pixel_budget: u32,
    /// Smallest accepted side length in pixels
    pub min_side: u32,
    /// Largest accepted side length in pixels
    pub max_side: u32,
    /// Whether the model accepts the `raw` flag
    pub supports_raw: bool,
    /// Maximum prompt length in characters
    pub max_prompt_length: usize,
}

// =============================================================================
// Static Model Definitions
// =============================================================================

/// FLUX1.1 [pro]
pub const FLUX_PRO_1_1: FluxModel = FluxModel {
    id: "flux-pro-1.1",
    aliases: &["flux-1.1-pro", "flux-pro-11", "flux1.1-pro"],
    endpoint: "flux-pro-1.1",
    geometry: GeometryMode::Dimensions,
    pixel_budget: 1024 * 1024,
    min_side: 256,
    max_side: 1440,
    supports_raw: false,
    max_prompt_length: 10_000,
};

/// FLUX1.1 [pro] Ultra
pub const FLUX_PRO_1_1_ULTRA: FluxModel = FluxModel {
    id: "flux-pro-1.1-ultra",
    aliases: &["flux-ultra", "flux-1.1-ultra", "flux-pro-ultra"],
    endpoint: "flux-pro-1.1-ultra",
    geometry: GeometryMode::AspectRatio,
    pixel_budget: 2048 * 2048,
    min_side: 256,
    max_side: 3520,
    supports_raw: true,
    max_prompt_length: 10_000,
};

/// FLUX.1 [pro]
pub const FLUX_PRO: FluxModel = FluxModel {
    id: "flux-pro",
    aliases: &["flux-1-pro", "flux.1-pro"],
    endpoint: "flux-pro",
    geometry: GeometryMode::Dimensions,
    pixel_budget: 1024 * 1024,
    min_side: 256,
    max_side: 1440,
    supports_raw: false,
    max_prompt_length: 10_000,
};

/// FLUX.1 [dev]
pub const FLUX_DEV: FluxModel = FluxModel {
    id: "flux-dev",
    aliases: &["flux-1-dev", "flux.1-dev"],
    endpoint: "flux-dev",
    geometry: GeometryMode::Dimensions,
    pixel_budget: 1024 * 1024,
    min_side: 256,
    max_side: 1440,
    supports_raw: false,
    max_prompt_length: 10_000,
};

/// FLUX.1 Kontext [pro]
pub const FLUX_KONTEXT_PRO: FluxModel = FluxModel {
    id: "flux-kontext-pro",
    aliases: &["kontext-pro", "flux-kontext"],
    endpoint: "flux-kontext-pro",
    geometry: GeometryMode::AspectRatio,
    pixel_budget: 1024 * 1024,
    min_side: 256,
    max_side: 2048,
    supports_raw: false,
    max_prompt_length: 10_000,
};

/// FLUX.1 Kontext [max]
pub const FLUX_KONTEXT_MAX: FluxModel = FluxModel {
    id: "flux-kontext-max",
    aliases: &["kontext-max"],
    endpoint: "flux-kontext-max",
    geometry: GeometryMode::AspectRatio,
    pixel_budget: 1024 * 1024,
    min_side: 256,
    max_side: 2048,
    supports_raw: false,
    max_prompt_length: 10_000,
};

/// All available Flux models, default first
pub const FLUX_MODELS: &[FluxModel] = &[
    FLUX_PRO_1_1,
    FLUX_PRO_1_1_ULTRA,
    FLUX_PRO,
    FLUX_DEV,
    FLUX_KONTEXT_PRO,
    FLUX_KONTEXT_MAX,
];

/// Model registry for resolving model names and aliases.
pub struct ModelRegistry;

impl ModelRegistry {
    /// Resolve a model name or alias to its definition.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// # Example
    ///
    /// ```
    /// use flux_mcp_common::models::ModelRegistry;
    ///
    /// let model = ModelRegistry::resolve("flux-ultra").unwrap();
    /// assert_eq!(model.id, "flux-pro-1.1-ultra");
    /// ```
    pub fn resolve(name: &str) -> Option<&'static FluxModel> {
        let name = name.trim().to_ascii_lowercase();
        FLUX_MODELS
            .iter()
            .find(|m| m.id == name || m.aliases.iter().any(|a| *a == name))
    }

    /// List all available models.
    pub fn list() -> &'static [FluxModel] {
        FLUX_MODELS
    }

    /// Comma-separated model ids, for error messages.
    pub fn ids() -> String {
        FLUX_MODELS.iter().map(|m| m.id).collect::<Vec<_>>().join(", ")
    }
}
