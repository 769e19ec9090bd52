//! Exponential-backoff retry for transient S&S API failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::SsError;

/// True for conditions worth retrying: 429s, network-level failures, and
/// 5xx statuses. Everything else (404, 4xx, parse failures) would return
/// the same result again.
fn is_retriable(err: &SsError) -> bool {
    match err {
        SsError::RateLimited { .. } | SsError::Http(_) => true,
        SsError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries` extra
/// attempts with a `backoff_base_secs * 2^attempt` sleep between tries.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, SsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SsError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && attempt < max_retries => {
                let sleep_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(16));
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    sleep_secs,
                    error = %err,
                    "transient S&S API failure, backing off"
                );
                tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn non_retriable_errors_return_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SsError> = retry_with_backoff(3, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SsError::NotFound {
                    url: "http://example/styles".to_string(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(SsError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retriable_errors_exhaust_then_propagate() {
        let calls = AtomicU32::new(0);
        let result: Result<(), SsError> = retry_with_backoff(2, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SsError::RateLimited {
                    retry_after_secs: 0,
                })
            }
        })
        .await;
        assert!(matches!(result, Err(SsError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(3, 0, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(SsError::UnexpectedStatus {
                        status: 503,
                        url: "http://example/styles".to_string(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
    }
}
