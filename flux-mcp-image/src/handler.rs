//! Flux generation adapter.
//!
//! [`FluxAdapter::generate`] runs the whole pipeline for one prompt:
//! normalize, submit, poll, extract. It always returns a
//! [`GenerationResult`]; failures of any kind come back as error results.

use crate::client::{FluxApi, HttpFluxClient};
use crate::params::{GenerationSettings, normalize};
use crate::poller::{Clock, Poller, PollerConfig, TokioClock};
use crate::result::{GenerationResult, extract};
use crate::submitter;
use flux_mcp_common::auth::ApiKey;
use flux_mcp_common::config::Config;
use flux_mcp_common::error::Error;
use std::any::Any;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Image generation adapter.
///
/// Holds read-only configuration only. Clones share the HTTP connection pool
/// and may run `generate` concurrently.
#[derive(Clone)]
pub struct FluxAdapter {
    settings: Arc<GenerationSettings>,
    api_key: Option<ApiKey>,
    api: Arc<dyn FluxApi>,
    clock: Arc<dyn Clock>,
    poller: Arc<PollerConfig>,
}

impl std::fmt::Debug for FluxAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluxAdapter")
            .field("settings", &self.settings)
            .field("api_key", &self.api_key)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl FluxAdapter {
    /// Create an adapter around any [`FluxApi`] implementation.
    pub fn new(
        settings: GenerationSettings,
        api_key: Option<ApiKey>,
        api: Arc<dyn FluxApi>,
        poller: PollerConfig,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            api_key,
            api,
            clock: Arc::new(TokioClock),
            poller: Arc::new(poller),
        }
    }

    /// Create an adapter talking to the configured service over HTTP.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config, settings: GenerationSettings) -> Result<Self, Error> {
        let api = HttpFluxClient::new(config)?;
        Ok(Self::new(
            settings,
            config.api_key.clone(),
            Arc::new(api),
            PollerConfig::from_config(config),
        ))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Same adapter with different generation settings.
    pub fn with_settings(&self, settings: GenerationSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            ..self.clone()
        }
    }

    /// The generation settings this adapter applies to every call.
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate one image for `prompt`.
    ///
    /// The work runs on its own task. Cancelling `cancel`, or dropping the
    /// returned future, stops polling promptly.
    pub async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> GenerationResult {
        let task_cancel = cancel.child_token();
        let _guard = task_cancel.clone().drop_guard();

        let adapter = self.clone();
        let prompt = prompt.to_string();
        let task = tokio::spawn(async move { adapter.run(&prompt, &task_cancel).await });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                error!(panic = %message, "Generation task panicked");
                Error::internal(format!("generation task panicked: {}", message)).into()
            }
            Err(e) => {
                error!(error = %e, "Generation task did not complete");
                Error::internal(format!("generation task did not complete: {}", e)).into()
            }
        }
    }

    #[instrument(name = "generate", skip_all, fields(model = %self.settings.model))]
    async fn run(&self, prompt: &str, cancel: &CancellationToken) -> GenerationResult {
        let request = match normalize(prompt, &self.settings) {
            Ok(request) => request,
            Err(e) => return e.into(),
        };

        let key = match ApiKey::require(self.api_key.as_ref()) {
            Ok(key) => key,
            Err(e) => return e.into(),
        };

        info!(
            model = request.model.id,
            width = request.geometry.width,
            height = request.geometry.height,
            aspect_ratio = ?request.aspect_ratio,
            "Generating image"
        );

        let job = match submitter::submit(self.api.as_ref(), &request, key, cancel).await {
            Ok(job) => job,
            Err(e) => return e.into(),
        };

        let poller = Poller::new(self.api.as_ref(), self.clock.as_ref(), &self.poller);
        extract(poller.wait(&job, key, cancel).await, &request)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Asset, JobHandle, PollOutcome};
    use crate::params::GenerationRequest;
    use async_trait::async_trait;
    use flux_mcp_common::error::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Counts calls. Polls return Pending `pending` times, then `terminal`.
    struct CountingApi {
        pending: u32,
        terminal: PollOutcome,
        submits: AtomicU32,
        polls: AtomicU32,
        panic_on_poll: bool,
    }

    impl CountingApi {
        fn new(pending: u32, terminal: PollOutcome) -> Self {
            Self {
                pending,
                terminal,
                submits: AtomicU32::new(0),
                polls: AtomicU32::new(0),
                panic_on_poll: false,
            }
        }

        fn submits(&self) -> u32 {
            self.submits.load(Ordering::SeqCst)
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FluxApi for CountingApi {
        async fn submit(&self, _: &GenerationRequest, _: &ApiKey) -> Result<JobHandle, Error> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(JobHandle {
                id: "job-1".to_string(),
                polling_url: "http://localhost/get_result?id=job-1".to_string(),
            })
        }

        async fn poll(&self, _: &JobHandle, _: &ApiKey) -> Result<PollOutcome, Error> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_poll {
                panic!("status decoder exploded");
            }
            if n < self.pending {
                Ok(PollOutcome::Pending)
            } else {
                Ok(self.terminal.clone())
            }
        }
    }

    fn success() -> PollOutcome {
        PollOutcome::Succeeded(Asset {
            url: "https://example/img.png".to_string(),
            seed: None,
            revised_prompt: None,
        })
    }

    fn adapter(api: Arc<CountingApi>, key: Option<&str>) -> FluxAdapter {
        FluxAdapter::new(
            GenerationSettings::default(),
            key.and_then(ApiKey::new),
            api,
            PollerConfig {
                timeout: Duration::from_secs(10),
                ..PollerConfig::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success() {
        let api = Arc::new(CountingApi::new(2, success()));
        let result = adapter(api.clone(), Some("key")).generate("a red cube", &CancellationToken::new()).await;

        assert_eq!(result.image(), Some("https://example/img.png"));
        assert_eq!(api.submits(), 1);
        assert_eq!(api.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key_makes_no_calls() {
        let api = Arc::new(CountingApi::new(0, success()));
        let result = adapter(api.clone(), None).generate("a red cube", &CancellationToken::new()).await;

        assert_eq!(result.kind(), Some(ErrorKind::Authentication));
        assert_eq!(api.submits(), 0);
        assert_eq!(api.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_makes_no_calls() {
        let api = Arc::new(CountingApi::new(0, success()));
        let adapter = adapter(api.clone(), Some("key")).with_settings(GenerationSettings {
            safety_tolerance: 11,
            ..GenerationSettings::default()
        });
        let result = adapter.generate("a red cube", &CancellationToken::new()).await;

        assert_eq!(result.kind(), Some(ErrorKind::Validation));
        assert_eq!(api.submits(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_result() {
        let api = Arc::new(CountingApi::new(u32::MAX, success()));
        let result = adapter(api.clone(), Some("key")).generate("a red cube", &CancellationToken::new()).await;

        assert_eq!(result.kind(), Some(ErrorKind::Timeout));
        let value = result.to_value();
        assert_eq!(value["error_type"], "TimeoutError");
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_becomes_internal_error() {
        let api = Arc::new(CountingApi {
            panic_on_poll: true,
            ..CountingApi::new(0, success())
        });
        let result = adapter(api, Some("key")).generate("a red cube", &CancellationToken::new()).await;

        assert_eq!(result.kind(), Some(ErrorKind::Unknown));
        let value = result.to_value();
        assert_eq!(value["error_type"], "InternalError");
        assert!(value["message"].as_str().unwrap().contains("status decoder exploded"));
        assert!(value["details"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_cancellation() {
        let api = Arc::new(CountingApi::new(u32::MAX, success()));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let result = adapter(api.clone(), Some("key")).generate("a red cube", &cancel).await;
        assert_eq!(result.kind(), Some(ErrorKind::Cancelled));

        let polls = api.polls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.polls(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_generate_stops_polling() {
        let api = Arc::new(CountingApi::new(u32::MAX, success()));
        let adapter = adapter(api.clone(), Some("key"));

        let cancel = CancellationToken::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            adapter.generate("a red cube", &cancel),
        )
        .await;
        assert!(outcome.is_err(), "generate should still be polling");

        // Let the spawned task observe the dropped guard
        tokio::time::sleep(Duration::from_millis(10)).await;
        let polls = api.polls();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.polls(), polls);
        assert!(!cancel.is_cancelled(), "caller token is left untouched");
    }

    #[test]
    fn test_debug_redacts_key() {
        let api = Arc::new(CountingApi::new(0, success()));
        let debug = format!("{:?}", adapter(api, Some("top-secret")));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_settings_are_exposed_read_only() {
        let api = Arc::new(CountingApi::new(0, success()));
        let adapter = adapter(api, Some("key"));
        assert_eq!(adapter.settings().model, GenerationSettings::default().model);
        assert_eq!(adapter.settings().aspect_ratio, GenerationSettings::default().aspect_ratio);
    }
}
