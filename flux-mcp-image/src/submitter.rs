//! Job submission.
//!
//! A submission creates a billable job, so it is never repeated silently.
//! The one exception is a connection failure, where the request cannot have
//! reached the service: that case gets a single immediate retry.

use crate::client::{FluxApi, JobHandle};
use crate::params::GenerationRequest;
use flux_mcp_common::auth::ApiKey;
use flux_mcp_common::error::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Submit `request`, retrying once on a transport error.
///
/// # Errors
/// - `Error::Cancelled` if `cancel` fires before a handle is obtained
/// - Whatever the service call returns otherwise, including the second
///   transport error when the retry also fails
pub async fn submit(
    api: &dyn FluxApi,
    request: &GenerationRequest,
    key: &ApiKey,
    cancel: &CancellationToken,
) -> Result<JobHandle, Error> {
    let first = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::cancelled(0)),
        result = api.submit(request, key) => result,
    };

    let handle = match first {
        Err(Error::Transport(reason)) => {
            warn!(reason = %reason, "Submission failed to connect, retrying once");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::cancelled(0)),
                result = api.submit(request, key) => result?,
            }
        }
        other => other?,
    };

    info!(id = %handle.id, model = request.model.id, "Generation job submitted");
    Ok(handle)
}
