//! Tool-facing generation results.
//!
//! Every call ends in a [`GenerationResult`]: either the image URL with its
//! metadata, or a classified error. Nothing else crosses the tool boundary.

use crate::params::GenerationRequest;
use crate::poller::Completion;
use flux_mcp_common::error::{Error, ErrorKind};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Final outcome of one `generate` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        /// Image URL reported by the service
        image: String,
        /// Model, geometry and job metadata
        meta: Map<String, Value>,
    },
    Error {
        /// Human-readable description
        message: String,
        /// Stable error type label, e.g. "TimeoutError"
        error_type: String,
        /// Stable category
        kind: ErrorKind,
        /// Full diagnostics, only for uncategorized errors
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    /// The image URL, on success.
    pub fn image(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { image, .. } => Some(image),
            GenerationResult::Error { .. } => None,
        }
    }

    /// The error category, on failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Error { kind, .. } => Some(*kind),
        }
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({
                "status": "error",
                "message": format!("Failed to serialize result: {}", e),
                "error_type": "InternalError",
                "kind": ErrorKind::Unknown,
            })
        })
    }
}

impl From<Error> for GenerationResult {
    fn from(error: Error) -> Self {
        let kind = error.kind();
        GenerationResult::Error {
            message: error.to_string(),
            error_type: error.type_name().to_string(),
            kind,
            details: (kind == ErrorKind::Unknown).then(|| error.diagnostics()),
        }
    }
}

/// Build the final result from the polling outcome and the request that produced it.
pub fn extract(outcome: Result<Completion, Error>, request: &GenerationRequest) -> GenerationResult {
    let completion = match outcome {
        Ok(completion) => completion,
        Err(error) => return error.into(),
    };

    let mut meta = Map::new();
    meta.insert("model".into(), json!(request.model.id));
    meta.insert("width".into(), json!(request.geometry.width));
    meta.insert("height".into(), json!(request.geometry.height));
    if let Some(ratio) = request.aspect_ratio {
        meta.insert("aspect_ratio".into(), json!(ratio));
    }
    meta.insert("raw".into(), json!(request.raw));
    meta.insert("safety_tolerance".into(), json!(request.safety_tolerance));
    meta.insert("prompt_upsampling".into(), json!(request.prompt_upsampling));
    meta.insert("id".into(), json!(completion.job_id));
    if let Some(seed) = completion.asset.seed {
        meta.insert("seed".into(), json!(seed));
    }
    if let Some(prompt) = &completion.asset.revised_prompt {
        meta.insert("revised_prompt".into(), json!(prompt));
    }
    meta.insert("poll_attempts".into(), json!(completion.attempts));
    meta.insert("elapsed_ms".into(), json!(completion.elapsed.as_millis() as u64));

    GenerationResult::Success {
        image: completion.asset.url,
        meta,
    }
}
