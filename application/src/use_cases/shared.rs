//! Shared utilities for use cases.

use changebench_domain::DomainError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(DomainError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), DomainError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}

/// Sleep for `duration`, returning early with `Cancelled` if the token fires.
pub(crate) async fn sleep_cancellable(
    duration: Duration,
    token: &Option<CancellationToken>,
) -> Result<(), DomainError> {
    if duration.is_zero() {
        return check_cancelled(token);
    }
    match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(DomainError::Cancelled),
                _ = tokio::time::sleep(duration) => Ok(()),
            }
        }
        None => {
            tokio::time::sleep(duration).await;
            Ok(())
        }
    }
}
