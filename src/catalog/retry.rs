//! Retry with exponential back-off and jitter for catalog calls.
//!
//! Only the mandatory detail call goes through [`retry_with_backoff`];
//! secondary calls get one shot because their failures merely degrade the
//! reply.

use std::future::Future;
use std::time::Duration;

use crate::error::CatalogError;

/// Returns `true` for errors worth one more attempt after a back-off delay.
///
/// **Retriable:** rate limiting, connection failures, HTTP 5xx.
///
/// **Not retriable:**
/// - Timeouts. A call that blew its time budget already made the user wait;
///   trying again doubles the damage.
/// - `NotFound`, `Api`, `MissingField`, `Empty`, `Decode` — the gateway
///   answered; asking again gets the same answer.
pub(crate) fn is_retriable(err: &CatalogError) -> bool {
    match err {
        CatalogError::RateLimited(_) => true,
        CatalogError::Http(e) => {
            !e.is_timeout() && (e.is_connect() || e.status().is_some_and(|s| s.is_server_error()))
        }
        CatalogError::NotFound(_)
        | CatalogError::Api { .. }
        | CatalogError::Empty { .. }
        | CatalogError::MissingField { .. }
        | CatalogError::Decode { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Delay doubles per attempt from `backoff_base_ms`,
/// capped at 30 s, with ±25 % jitter.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient catalog error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
