//! Bounded retry for dial attempts.

use std::future::Future;

use tokio::time::sleep;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{ClientError, Result};

/// Run `attempt` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent.
///
/// `attempt` receives the 1-based attempt number. Between two failed
/// attempts the calling task sleeps for `policy.wait_retry()`; there is no
/// wait after the last one. Errors that are not
/// [transient](ClientError::is_transient) are returned as-is without
/// another attempt. Exhausting the budget yields [`ClientError::Timeout`]
/// carrying the last error.
pub async fn retry_connect<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last: Option<ClientError> = None;

    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                warn!(
                    attempt = n,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "dial attempt failed"
                );
                last = Some(e);
            }
        }

        if n < policy.max_attempts {
            sleep(policy.wait_retry()).await;
        }
    }

    Err(ClientError::Timeout {
        attempts: policy.max_attempts,
        last: last.map(Box::new),
    })
}
