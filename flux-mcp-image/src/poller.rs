//! Completion polling for submitted jobs.
//!
//! A submitted job moves through `Polling` until the service reports a
//! terminal outcome, the wall-clock ceiling passes, or the caller cancels.
//! Delays between status queries grow by [`BACKOFF_MULTIPLIER`] up to the
//! configured cap. Every wait and every status query is raced against both
//! the deadline and the cancellation token.

use crate::client::{Asset, FluxApi, JobHandle, PollOutcome, JOB_INVALIDATED};
use async_trait::async_trait;
use flux_mcp_common::auth::ApiKey;
use flux_mcp_common::config::Config;
use flux_mcp_common::error::Error;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Growth factor applied to the delay after each pending status.
pub const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Time source for the poller.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer. Honors paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Polling cadence and ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Delay before the first status query
    pub initial_interval: Duration,
    /// Cap on the delay between queries
    pub max_interval: Duration,
    /// Growth factor per pending status
    pub multiplier: f64,
    /// Overall polling ceiling
    pub timeout: Duration,
}

impl PollerConfig {
    /// Build the poller settings from server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.poll_interval_ms),
            max_interval: Duration::from_millis(config.poll_max_interval_ms),
            multiplier: BACKOFF_MULTIPLIER,
            timeout: Duration::from_secs(config.poll_timeout_secs),
        }
    }

    /// Delay to use after `current` when the job is still pending.
    pub fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max_interval)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A job that reached `Succeeded`.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Id of the job that produced the asset
    pub job_id: String,
    /// The generated asset
    pub asset: Asset,
    /// Status queries issued, including the successful one
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Terminal states of the poll loop.
enum Terminal {
    Succeeded(Asset),
    Failed(String),
    TimedOut,
    Cancelled,
    Errored(Error),
}

/// Drives one job from `Polling` to a terminal state.
pub struct Poller<'a> {
    api: &'a dyn FluxApi,
    clock: &'a dyn Clock,
    config: &'a PollerConfig,
}

impl<'a> Poller<'a> {
    /// Create a poller over the given service, clock and cadence.
    pub fn new(api: &'a dyn FluxApi, clock: &'a dyn Clock, config: &'a PollerConfig) -> Self {
        Self { api, clock, config }
    }

    /// Poll `job` until it completes.
    ///
    /// # Errors
    /// - `Error::ServiceFailure` with the service's reason when the job fails,
    ///   or with "job handle invalidated" when the service forgot the job
    /// - `Error::Timeout` when the ceiling passes first
    /// - `Error::Cancelled` when `cancel` fires first
    /// - Any error from the status query itself; queries are not retried
    #[instrument(level = "debug", skip_all, fields(id = %job.id))]
    pub async fn wait(
        &self,
        job: &JobHandle,
        key: &ApiKey,
        cancel: &CancellationToken,
    ) -> Result<Completion, Error> {
        let started = self.clock.now();
        let deadline = started + self.config.timeout;
        let mut attempts: u32 = 0;
        let mut delay = self.config.initial_interval;

        let terminal = loop {
            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                break Terminal::TimedOut;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Terminal::Cancelled,
                _ = self.clock.sleep(delay.min(remaining)) => {}
            }

            let remaining = deadline.saturating_duration_since(self.clock.now());
            if remaining.is_zero() {
                break Terminal::TimedOut;
            }

            attempts += 1;
            debug!(attempt = attempts, "Querying job status");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Terminal::Cancelled,
                _ = self.clock.sleep(remaining) => break Terminal::TimedOut,
                outcome = self.api.poll(job, key) => outcome,
            };

            match outcome {
                Ok(PollOutcome::Pending) => {
                    delay = self.config.next_interval(delay);
                    debug!(attempt = attempts, next_delay_ms = delay.as_millis() as u64, "Job pending");
                }
                Ok(PollOutcome::Succeeded(asset)) => break Terminal::Succeeded(asset),
                Ok(PollOutcome::Failed(reason)) => break Terminal::Failed(reason),
                Ok(PollOutcome::Expired) => break Terminal::Failed(JOB_INVALIDATED.to_string()),
                Err(e) => break Terminal::Errored(e),
            }
        };

        let elapsed = self.clock.now().saturating_duration_since(started);
        match terminal {
            Terminal::Succeeded(asset) => {
                info!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Job succeeded");
                Ok(Completion {
                    job_id: job.id.clone(),
                    asset,
                    attempts,
                    elapsed,
                })
            }
            Terminal::Failed(reason) => {
                warn!(attempts, reason = %reason, "Job failed");
                Err(Error::service_failure(reason))
            }
            Terminal::TimedOut => {
                warn!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Gave up waiting for job");
                Err(Error::timeout(self.config.timeout.as_secs(), attempts))
            }
            Terminal::Cancelled => {
                info!(attempts, "Polling cancelled by caller");
                Err(Error::cancelled(attempts))
            }
            Terminal::Errored(e) => {
                warn!(attempts, error = %e, "Status query failed");
                Err(e)
            }
        }
    }
}
