//! Deadline utility shared by every external call.
//!
//! A future that misses its deadline is dropped; nothing is sent to the remote
//! side to cancel work already in flight.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// An operation did not finish within its limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} timed out after {limit:?}")]
pub struct DeadlineExceeded {
    pub operation: &'static str,
    pub limit: Duration,
}

/// Runs `future` to completion or until `limit` elapses.
///
/// # Example
///
/// ```ignore
/// let listing = with_deadline(Duration::from_secs(20), "tools/list", tools.list_tools()).await;
/// match listing {
///     Ok(Ok(tools)) => { /* answered in time */ }
///     Ok(Err(e)) => { /* answered with an error */ }
///     Err(deadline) => { /* too slow */ }
/// }
/// ```
pub async fn with_deadline<F, T>(
    limit: Duration,
    operation: &'static str,
    future: F,
) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| DeadlineExceeded { operation, limit })
}
