use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const BASE_BACKOFF_MS: u64 = 500;
const MAX_ATTEMPTS: u32 = 2;

/// Run a network-bound provider call with a deadline and a single retry.
///
/// `f` is invoked fresh for each attempt. An attempt that exceeds `limit`
/// counts as a transient failure. Only transient errors are retried; the
/// retry waits `BASE_BACKOFF_MS` before the second attempt.
///
/// # Errors
///
/// Returns the final attempt's error, or `LlmError::Timeout` if it exceeded
/// the deadline.
pub async fn call_bounded<T, F, Fut>(
    provider: &'static str,
    op: &str,
    limit: Duration,
    mut f: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(limit, f()).await {
            Ok(r) => r,
            Err(_) => Err(LlmError::Timeout(limit)),
        };
        match result {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 < MAX_ATTEMPTS && e.is_transient() => {
                let delay = Duration::from_millis(BASE_BACKOFF_MS << attempt);
                tracing::warn!(
                    "{provider} {op} failed ({e}), retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = call_bounded("test", "op", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_retried_once() {
        let calls = AtomicU32::new(0);
        let result = call_bounded("test", "op", Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(LlmError::Api {
                        provider: "test",
                        message: "flaky".into(),
                    })
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_exhausts_after_two_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_bounded("test", "op", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(LlmError::Api {
                    provider: "test",
                    message: "down".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(LlmError::Api { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_transient_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_bounded("test", "op", Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmError::EmbedUnsupported { provider: "test" }) }
        })
        .await;
        assert!(matches!(result, Err(LlmError::EmbedUnsupported { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_exceeded_maps_to_timeout() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_bounded("test", "op", Duration::from_millis(50), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        })
        .await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
        // Timed out, retried once, timed out again.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
