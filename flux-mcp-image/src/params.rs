//! Generation parameters and their normalization.
//!
//! [`GenerationSettings`] holds the caller-facing knobs with their tool
//! defaults. [`normalize`] validates them together with a prompt and resolves
//! the final output geometry, producing an immutable [`GenerationRequest`].
//! Normalization is pure: no I/O, and the same input always yields the same
//! request.

use flux_mcp_common::error::Error;
use flux_mcp_common::models::{FluxModel, GeometryMode, ModelRegistry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Supported aspect-ratio tokens, widest first.
pub const ASPECT_RATIOS: &[&str] = &[
    "21:9", "16:9", "3:2", "4:3", "1:1", "3:4", "2:3", "9:16", "9:21",
];

/// Default model for image generation.
pub const DEFAULT_MODEL: &str = "flux-pro-1.1";

/// Default aspect ratio.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Default width, used only when no aspect ratio is given.
pub const DEFAULT_WIDTH: i64 = 1024;

/// Default height, used only when no aspect ratio is given.
pub const DEFAULT_HEIGHT: i64 = 1024;

/// Default safety tolerance.
pub const DEFAULT_SAFETY_TOLERANCE: i64 = 6;

/// Minimum safety tolerance (strictest).
pub const MIN_SAFETY_TOLERANCE: i64 = 0;

/// Maximum safety tolerance (most permissive).
pub const MAX_SAFETY_TOLERANCE: i64 = 10;

/// Explicit dimensions must be multiples of this.
pub const DIMENSION_STEP: u32 = 32;

/// Generation settings, everything except the prompt.
///
/// These are fixed when an adapter is built and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationSettings {
    /// Flux model to use. Defaults to "flux-pro-1.1".
    #[serde(default = "default_model")]
    pub model: String,

    /// Aspect ratio token, e.g. "16:9". Takes precedence over width/height.
    /// Pass null (or an empty string) to use width/height instead.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: Option<String>,

    /// Width in pixels, used only when aspect_ratio is absent.
    #[serde(default = "default_width")]
    pub width: i64,

    /// Height in pixels, used only when aspect_ratio is absent.
    #[serde(default = "default_height")]
    pub height: i64,

    /// Raw mode for less processed, more natural-looking output.
    #[serde(default)]
    pub raw: bool,

    /// Safety filter level, 0 (strict) to 10 (permissive).
    #[serde(default = "default_safety_tolerance")]
    pub safety_tolerance: i64,

    /// Let the service rewrite the prompt for more detail.
    #[serde(default)]
    pub prompt_upsampling: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_aspect_ratio() -> Option<String> {
    Some(DEFAULT_ASPECT_RATIO.to_string())
}

fn default_width() -> i64 {
    DEFAULT_WIDTH
}

fn default_height() -> i64 {
    DEFAULT_HEIGHT
}

fn default_safety_tolerance() -> i64 {
    DEFAULT_SAFETY_TOLERANCE
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            aspect_ratio: default_aspect_ratio(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            raw: false,
            safety_tolerance: DEFAULT_SAFETY_TOLERANCE,
            prompt_upsampling: false,
        }
    }
}

/// Validation error details for generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Final output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

/// A validated, canonical generation request. Created once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Prompt text, as supplied
    pub prompt: String,
    /// Resolved model definition
    pub model: &'static FluxModel,
    /// Canonical aspect-ratio token, when one drove the geometry
    pub aspect_ratio: Option<&'static str>,
    /// Geometry the image will be produced at
    pub geometry: Geometry,
    /// Effective raw flag (false when the model does not support it)
    pub raw: bool,
    /// Safety tolerance, 0-10
    pub safety_tolerance: u8,
    /// Prompt upsampling flag
    pub prompt_upsampling: bool,
}

impl GenerationSettings {
    /// Validate the settings against `prompt` and resolve the canonical request.
    ///
    /// # Returns
    /// - `Ok(GenerationRequest)` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with every validation error found
    pub fn normalize(&self, prompt: &str) -> Result<GenerationRequest, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let model = ModelRegistry::resolve(&self.model);
        if model.is_none() {
            errors.push(ValidationError::new(
                "model",
                format!("Unknown model '{}'. Valid models: {}", self.model, ModelRegistry::ids()),
            ));
        }

        if prompt.trim().is_empty() {
            errors.push(ValidationError::new("prompt", "Prompt cannot be empty"));
        } else if let Some(model) = model {
            let length = prompt.chars().count();
            if length > model.max_prompt_length {
                errors.push(ValidationError::new(
                    "prompt",
                    format!(
                        "Prompt length {} exceeds maximum {} for model {}",
                        length, model.max_prompt_length, model.id
                    ),
                ));
            }
        }

        let safety_tolerance = if (MIN_SAFETY_TOLERANCE..=MAX_SAFETY_TOLERANCE)
            .contains(&self.safety_tolerance)
        {
            Some(self.safety_tolerance as u8)
        } else {
            errors.push(ValidationError::new(
                "safety_tolerance",
                format!(
                    "safety_tolerance must be between {} and {}, got {}",
                    MIN_SAFETY_TOLERANCE, MAX_SAFETY_TOLERANCE, self.safety_tolerance
                ),
            ));
            None
        };

        let resolved = self.resolve_geometry(model, &mut errors);

        match (model, resolved, safety_tolerance) {
            (Some(model), Some((aspect_ratio, geometry)), Some(safety_tolerance))
                if errors.is_empty() =>
            {
                let raw = self.raw && model.supports_raw;
                if self.raw && !model.supports_raw {
                    warn!(model = model.id, "raw mode is not supported by this model, ignoring");
                }

                Ok(GenerationRequest {
                    prompt: prompt.to_string(),
                    model,
                    aspect_ratio,
                    geometry,
                    raw,
                    safety_tolerance,
                    prompt_upsampling: self.prompt_upsampling,
                })
            }
            _ => Err(errors),
        }
    }

    /// The aspect-ratio token, treating blank strings as absent.
    fn requested_aspect_ratio(&self) -> Option<&str> {
        self.aspect_ratio
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    fn resolve_geometry(
        &self,
        model: Option<&'static FluxModel>,
        errors: &mut Vec<ValidationError>,
    ) -> Option<(Option<&'static str>, Geometry)> {
        if let Some(token) = self.requested_aspect_ratio() {
            let Some(canonical) = ASPECT_RATIOS.iter().copied().find(|r| *r == token) else {
                errors.push(ValidationError::new(
                    "aspect_ratio",
                    format!(
                        "Invalid aspect ratio '{}'. Valid options: {}",
                        token,
                        ASPECT_RATIOS.join(", ")
                    ),
                ));
                return None;
            };

            if self.width != DEFAULT_WIDTH || self.height != DEFAULT_HEIGHT {
                debug!(
                    aspect_ratio = canonical,
                    width = self.width,
                    height = self.height,
                    "aspect_ratio takes precedence, ignoring width/height"
                );
            }

            let model = model?;
            return Some((Some(canonical), geometry_for_ratio(model, canonical)?));
        }

        let model = model?;
        let width = check_side("width", self.width, model, errors);
        let height = check_side("height", self.height, model, errors);
        let (width, height) = (width?, height?);

        match model.geometry {
            GeometryMode::Dimensions => Some((None, Geometry { width, height })),
            GeometryMode::AspectRatio => {
                let divisor = gcd(width, height);
                let reduced = format!("{}:{}", width / divisor, height / divisor);
                match ASPECT_RATIOS.iter().copied().find(|r| *r == reduced) {
                    Some(canonical) => Some((Some(canonical), geometry_for_ratio(model, canonical)?)),
                    None => {
                        errors.push(ValidationError::new(
                            "width",
                            format!(
                                "{}x{} reduces to {}, which {} does not support. \
                                 Pass one of these aspect ratios instead: {}",
                                width,
                                height,
                                reduced,
                                model.id,
                                ASPECT_RATIOS.join(", ")
                            ),
                        ));
                        None
                    }
                }
            }
        }
    }
}

fn check_side(
    field: &str,
    value: i64,
    model: &FluxModel,
    errors: &mut Vec<ValidationError>,
) -> Option<u32> {
    let min = i64::from(model.min_side);
    let max = i64::from(model.max_side);
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!(
                "{} must be between {} and {} for model {}, got {}",
                field, min, max, model.id, value
            ),
        ));
        return None;
    }
    if value % i64::from(DIMENSION_STEP) != 0 {
        errors.push(ValidationError::new(
            field,
            format!("{} must be a multiple of {}, got {}", field, DIMENSION_STEP, value),
        ));
        return None;
    }
    Some(value as u32)
}

/// Parse a `w:h` token into its two parts.
pub fn parse_ratio(token: &str) -> Option<(u32, u32)> {
    let (w, h) = token.split_once(':')?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

/// Derive the output size for an aspect ratio from the model's pixel budget.
///
/// When the long side would exceed the model's maximum, both sides shrink
/// together so the ratio holds. Each side is then rounded to the nearest
/// multiple of [`DIMENSION_STEP`] and clamped to the model's bounds.
pub fn geometry_for_ratio(model: &FluxModel, token: &str) -> Option<Geometry> {
    let (w, h) = parse_ratio(token)?;
    let budget = f64::from(model.pixel_budget);
    let ratio = f64::from(w) / f64::from(h);

    let ideal_width = (budget * ratio).sqrt();
    let ideal_height = (budget / ratio).sqrt();
    let scale = (f64::from(model.max_side) / ideal_width.max(ideal_height)).min(1.0);

    let snap = |side: f64| -> u32 {
        let step = f64::from(DIMENSION_STEP);
        let snapped = ((side * scale / step).round() * step) as u32;
        snapped.clamp(model.min_side, model.max_side)
    };

    Some(Geometry {
        width: snap(ideal_width),
        height: snap(ideal_height),
    })
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Normalize a prompt and settings into a request, flattening validation
/// errors into a single `Error::Validation`.
pub fn normalize(prompt: &str, settings: &GenerationSettings) -> Result<GenerationRequest, Error> {
    settings.normalize(prompt).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        Error::validation(messages.join("; "))
    })
}
