use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::core::error::FundError;

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error of the last attempt. Errors that
/// are not transient are returned straight away.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, FundError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FundError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries || !err.is_transient() {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// First `max_chars` characters of a response body, for error reports.
pub fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Maps a transport failure onto the upstream error class.
pub fn unavailable(context: &str, err: impl Display) -> FundError {
    FundError::UpstreamUnavailable(format!("{context}: {err}"))
}
