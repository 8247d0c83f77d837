use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Refresh this long before the provider-reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Process-wide bearer-token cache with expiry-aware lazy refresh.
///
/// Concurrent callers serialize on the slot, so an expired token is minted
/// exactly once rather than once per in-flight request.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token, or mint a new one via `refresh` when the
    /// cache is empty or inside the refresh margin. `refresh` yields the
    /// token together with its provider-reported time to live.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Duration), E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Instant::now() + REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        let (token, ttl) = refresh().await?;
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn fetch(cache: &TokenCache, mints: &AtomicU32, ttl: Duration) -> String {
        cache
            .get_or_refresh(|| async {
                let n = mints.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, Infallible>((format!("token-{n}"), ttl))
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_minted_once_and_reused() {
        let cache = TokenCache::new();
        let mints = AtomicU32::new(0);

        let first = fetch(&cache, &mints, Duration::from_secs(3600)).await;
        let second = fetch(&cache, &mints, Duration::from_secs(3600)).await;

        assert_eq!(first, "token-1");
        assert_eq!(second, "token-1");
        assert_eq!(mints.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn token_refreshes_inside_the_margin() {
        let cache = TokenCache::new();
        let mints = AtomicU32::new(0);

        fetch(&cache, &mints, Duration::from_secs(3600)).await;

        // Just before the margin: still cached.
        tokio::time::advance(Duration::from_secs(3600 - 61)).await;
        assert_eq!(fetch(&cache, &mints, Duration::from_secs(3600)).await, "token-1");

        // Inside the margin: refreshed.
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(fetch(&cache, &mints, Duration::from_secs(3600)).await, "token-2");
        assert_eq!(mints.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh() {
        let cache = TokenCache::new();
        let mints = AtomicU32::new(0);

        let (a, b) = futures::join!(
            fetch(&cache, &mints, Duration::from_secs(3600)),
            fetch(&cache, &mints, Duration::from_secs(3600)),
        );

        assert_eq!(a, b);
        assert_eq!(mints.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_error_propagates_and_leaves_cache_empty() {
        let cache = TokenCache::new();

        let result: Result<String, &str> = cache.get_or_refresh(|| async { Err("login failed") }).await;
        assert_eq!(result, Err("login failed"));

        let mints = AtomicU32::new(0);
        assert_eq!(fetch(&cache, &mints, Duration::from_secs(3600)).await, "token-1");
    }
}
