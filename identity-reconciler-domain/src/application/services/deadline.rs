use std::future::Future;
use std::time::Duration;

/// Run `future` with an upper bound on its duration, mapping expiry through
/// `on_elapsed` (called with the limit in milliseconds)
pub(crate) async fn within<F, T, E>(
    limit: Duration,
    future: F,
    on_elapsed: impl FnOnce(u64) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed(limit_millis(limit))),
    }
}

/// Milliseconds in `limit`, saturating at `u64::MAX`
fn limit_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}
