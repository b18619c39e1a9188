use std::time::Duration;

use crate::infra::config::ModelConfig;

/// Build a reqwest client with sane defaults (timeouts).
pub fn make_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(6))
        .build()
}

/// Build a reqwest client using the model section's timeouts.
pub fn make_http_client_with(cfg: &ModelConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
}

/// Exponential backoff for async ops. Only errors accepted by `retryable` are
/// retried; the first delay is `initial_delay_ms`, doubling up to 10x that (at least 1 s).
pub async fn retry_async_when<T, E, Fut, F, P>(
    attempts: u32,
    initial_delay_ms: u64,
    retryable: P,
    op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    retry_async_hinted(attempts, initial_delay_ms, retryable, |_| None, op).await
}

/// Like [`retry_async_when`], but a delay suggested by the error itself (e.g. a
/// `Retry-After` header) replaces the backoff delay for that attempt.
pub async fn retry_async_hinted<T, E, Fut, F, P, H>(
    mut attempts: u32,
    initial_delay_ms: u64,
    retryable: P,
    hint: H,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    H: Fn(&E) -> Option<Duration>,
{
    let mut try_num: u32 = 0;
    let mut delay_ms = initial_delay_ms;
    let max_delay_ms = initial_delay_ms.saturating_mul(10).max(1_000);
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !retryable(&e) {
                    return Err(e);
                }
                attempts -= 1;
                let wait = hint(&e).unwrap_or(Duration::from_millis(delay_ms));
                tracing::debug!(try_num, wait_ms = wait.as_millis() as u64, "retrying after failure");
                tokio::time::sleep(wait).await;
                delay_ms = (delay_ms * 2).min(max_delay_ms);
                try_num += 1;
            }
        }
    }
}
