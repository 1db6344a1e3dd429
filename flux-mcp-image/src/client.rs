//! HTTP client for the Black Forest Labs generation service.
//!
//! The service is asynchronous: a submission returns a job id plus a polling
//! URL, and the finished image is fetched by querying that URL until the job
//! reaches a terminal status. [`FluxApi`] is the seam the poller and facade
//! depend on; [`HttpFluxClient`] is the production implementation.

use crate::params::GenerationRequest;
use async_trait::async_trait;
use flux_mcp_common::auth::{ApiKey, API_KEY_HEADER};
use flux_mcp_common::config::Config;
use flux_mcp_common::error::Error;
use flux_mcp_common::models::GeometryMode;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Path of the status query used when the service gives no polling URL.
pub const GET_RESULT_PATH: &str = "get_result";

/// Reason attached to jobs the service no longer knows about.
pub const JOB_INVALIDATED: &str = "job handle invalidated";

/// Identifies one submitted job. Owned by a single generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Service-assigned job id
    pub id: String,
    /// URL to query for the job's status
    pub polling_url: String,
}

/// The finished image as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Signed URL of the generated image
    pub url: String,
    /// Seed the service used, when reported
    pub seed: Option<u64>,
    /// Prompt after upsampling, when reported
    pub revised_prompt: Option<String>,
}

/// Result of a single status query.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job is queued or still running
    Pending,
    /// Job finished and produced an image
    Succeeded(Asset),
    /// Job reached a terminal failure; the reason is the service's own wording
    Failed(String),
    /// The service no longer knows the job
    Expired,
}

/// Operations the adapter needs from the generation service.
#[async_trait]
pub trait FluxApi: Send + Sync {
    /// Submit a generation job. Issues exactly one outbound request.
    async fn submit(&self, request: &GenerationRequest, key: &ApiKey) -> Result<JobHandle, Error>;

    /// Query the status of a job. Side-effect free.
    async fn poll(&self, job: &JobHandle, key: &ApiKey) -> Result<PollOutcome, Error>;
}

// =============================================================================
// Wire types
// =============================================================================

/// Body of a submission request.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<bool>,
    safety_tolerance: u8,
    prompt_upsampling: bool,
}

impl<'a> SubmitBody<'a> {
    pub(crate) fn from_request(request: &'a GenerationRequest) -> Self {
        let model = request.model;
        let (width, height, aspect_ratio) = match model.geometry {
            GeometryMode::Dimensions => (
                Some(request.geometry.width),
                Some(request.geometry.height),
                None,
            ),
            GeometryMode::AspectRatio => (None, None, request.aspect_ratio),
        };

        Self {
            prompt: &request.prompt,
            width,
            height,
            aspect_ratio,
            raw: model.supports_raw.then_some(request.raw),
            safety_tolerance: request.safety_tolerance,
            prompt_upsampling: request.prompt_upsampling,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
    #[serde(default)]
    polling_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    result: Option<StatusResult>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    #[serde(default)]
    sample: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    prompt: Option<String>,
}

impl StatusResponse {
    fn into_outcome(self) -> PollOutcome {
        match self.status.as_str() {
            "Pending" => PollOutcome::Pending,
            "Ready" => match self.result {
                Some(StatusResult {
                    sample: Some(url),
                    seed,
                    prompt,
                }) => PollOutcome::Succeeded(Asset {
                    url,
                    seed,
                    revised_prompt: prompt,
                }),
                _ => PollOutcome::Failed("job reported Ready without an image".to_string()),
            },
            "Request Moderated" | "Content Moderated" | "Error" => {
                let reason = match &self.details {
                    Some(details) if !details.is_null() => format!("{}: {}", self.status, details),
                    _ => self.status.clone(),
                };
                PollOutcome::Failed(reason)
            }
            "Task not found" => PollOutcome::Expired,
            other => {
                warn!(status = other, "Unrecognized job status, treating as pending");
                PollOutcome::Pending
            }
        }
    }
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// `reqwest`-backed client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFluxClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFluxClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `Error::Internal` if the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn fallback_polling_url(&self, id: &str) -> Result<String, Error> {
        let endpoint = self.endpoint(GET_RESULT_PATH);
        let mut url = reqwest::Url::parse(&endpoint)
            .map_err(|e| Error::internal(format!("Invalid result endpoint {}: {}", endpoint, e)))?;
        url.query_pairs_mut().append_pair("id", id);
        Ok(url.to_string())
    }
}

/// Classify a send failure. Only connection failures count as transport errors.
fn send_error(endpoint: &str, e: reqwest::Error) -> Error {
    if e.is_connect() {
        Error::transport(format!("Could not connect to {}: {}", endpoint, e))
    } else {
        Error::api(endpoint, 0, format!("Request failed: {}", e))
    }
}

#[async_trait]
impl FluxApi for HttpFluxClient {
    #[instrument(level = "debug", skip_all, fields(model = request.model.id))]
    async fn submit(&self, request: &GenerationRequest, key: &ApiKey) -> Result<JobHandle, Error> {
        let endpoint = self.endpoint(request.model.endpoint);
        let body = SubmitBody::from_request(request);
        debug!(endpoint = %endpoint, "Submitting generation job");

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(&endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::authentication(format!(
                    "Service rejected the API key (HTTP {}): {}",
                    status.as_u16(),
                    body
                )),
                s if s.is_client_error() => Error::rejected(s.as_u16(), body),
                s if s.is_server_error() => Error::service_failure(format!(
                    "Service error on submission (HTTP {}): {}",
                    s.as_u16(),
                    body
                )),
                s => Error::api(&endpoint, s.as_u16(), body),
            });
        }

        let submitted: SubmitResponse = response.json().await.map_err(|e| {
            Error::api(&endpoint, status.as_u16(), format!("Failed to parse response: {}", e))
        })?;

        let polling_url = match submitted.polling_url.filter(|url| !url.is_empty()) {
            Some(url) => url,
            None => self.fallback_polling_url(&submitted.id)?,
        };

        debug!(id = %submitted.id, "Job submitted");
        Ok(JobHandle {
            id: submitted.id,
            polling_url,
        })
    }

    #[instrument(level = "debug", skip_all, fields(id = %job.id))]
    async fn poll(&self, job: &JobHandle, key: &ApiKey) -> Result<PollOutcome, Error> {
        let response = self
            .http
            .get(&job.polling_url)
            .header(API_KEY_HEADER, key.expose())
            .send()
            .await
            .map_err(|e| send_error(&job.polling_url, e))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Ok(PollOutcome::Expired),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::authentication(format!(
                    "Service rejected the API key while polling (HTTP {}): {}",
                    status.as_u16(),
                    body
                )));
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::api(&job.polling_url, s.as_u16(), body));
            }
            _ => {}
        }

        let parsed: StatusResponse = response.json().await.map_err(|e| {
            Error::api(
                &job.polling_url,
                status.as_u16(),
                format!("Failed to parse status response: {}", e),
            )
        })?;

        debug!(status = %parsed.status, "Job status");
        Ok(parsed.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationSettings;
    use serde_json::json;

    fn status(value: serde_json::Value) -> PollOutcome {
        serde_json::from_value::<StatusResponse>(value).unwrap().into_outcome()
    }

    #[test]
    fn test_ready_with_sample() {
        let outcome = status(json!({
            "id": "job-1",
            "status": "Ready",
            "result": {"sample": "https://example/img.png", "seed": 42, "prompt": "a red cube"}
        }));
        assert_eq!(
            outcome,
            PollOutcome::Succeeded(Asset {
                url: "https://example/img.png".to_string(),
                seed: Some(42),
                revised_prompt: Some("a red cube".to_string()),
            })
        );
    }

    #[test]
    fn test_ready_without_sample_is_failure() {
        let outcome = status(json!({"id": "job-1", "status": "Ready", "result": {}}));
        assert!(matches!(outcome, PollOutcome::Failed(_)));
    }

    #[test]
    fn test_moderated_keeps_details() {
        let outcome = status(json!({
            "status": "Content Moderated",
            "details": {"reason": "policy violation"}
        }));
        match outcome {
            PollOutcome::Failed(reason) => {
                assert!(reason.starts_with("Content Moderated"));
                assert!(reason.contains("policy violation"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_error_without_details() {
        assert_eq!(
            status(json!({"status": "Error", "details": null})),
            PollOutcome::Failed("Error".to_string())
        );
    }

    #[test]
    fn test_task_not_found_is_expired() {
        assert_eq!(status(json!({"status": "Task not found"})), PollOutcome::Expired);
    }

    #[test]
    fn test_unknown_status_is_pending() {
        assert_eq!(status(json!({"status": "Queued"})), PollOutcome::Pending);
    }

    #[test]
    fn test_submit_body_for_dimension_model() {
        let settings = GenerationSettings {
            aspect_ratio: None,
            width: 768,
            height: 512,
            ..GenerationSettings::default()
        };
        let request = settings.normalize("a fox").unwrap();
        let body = serde_json::to_value(SubmitBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "prompt": "a fox",
                "width": 768,
                "height": 512,
                "safety_tolerance": 6,
                "prompt_upsampling": false
            })
        );
    }

    #[test]
    fn test_submit_body_for_aspect_ratio_model() {
        let settings = GenerationSettings {
            model: "flux-pro-1.1-ultra".to_string(),
            raw: true,
            ..GenerationSettings::default()
        };
        let request = settings.normalize("a fox").unwrap();
        let body = serde_json::to_value(SubmitBody::from_request(&request)).unwrap();
        assert_eq!(body["aspect_ratio"], "16:9");
        assert_eq!(body["raw"], true);
        assert!(body.get("width").is_none());
    }

    #[test]
    fn test_fallback_polling_url() {
        let config = Config {
            api_base_url: "http://localhost:9999/v1".to_string(),
            ..Config::default()
        };
        let client = HttpFluxClient::new(&config).unwrap();
        assert_eq!(
            client.fallback_polling_url("job-1").unwrap(),
            "http://localhost:9999/v1/get_result?id=job-1"
        );
    }

    #[test]
    fn test_fallback_polling_url_escapes_id() {
        let config = Config {
            api_base_url: "http://localhost:9999/v1".to_string(),
            ..Config::default()
        };
        let client = HttpFluxClient::new(&config).unwrap();
        assert_eq!(
            client.fallback_polling_url("job 1&x=2#frag").unwrap(),
            "http://localhost:9999/v1/get_result?id=job+1%26x%3D2%23frag"
        );
    }
}
