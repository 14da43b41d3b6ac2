//! In-memory nonce store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::token::random_token;

/// Upper bound on outstanding nonces. Past it the least recently issued
/// or used nonce is dropped, so a client flooding 401s cannot grow the
/// store without limit.
pub const MAX_NONCES: u64 = 100_000;

/// Issued Digest nonces keyed by value.
///
/// A nonce is accepted for `window` after it was issued. Expiry and the
/// capacity bound are enforced by the cache itself.
pub struct NonceStore {
    nonces: Cache<String, ()>,
    window: Duration,
}

impl std::fmt::Debug for NonceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceStore")
            .field("window", &self.window)
            .field("outstanding", &self.nonces.entry_count())
            .finish()
    }
}

impl NonceStore {
    /// Creates a store whose nonces live for `window`.
    pub fn new(window: Duration) -> Arc<Self> {
        Arc::new(Self::with_capacity(window, MAX_NONCES))
    }

    /// Creates a store holding at most `capacity` nonces.
    pub fn with_capacity(window: Duration, capacity: u64) -> Self {
        let nonces = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(window.max(Duration::from_millis(1)))
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { nonces, window }
    }

    /// Issues and records a fresh nonce.
    pub async fn issue(&self) -> String {
        let nonce = random_token();
        self.nonces.insert(nonce.clone(), ()).await;
        nonce
    }

    /// Whether `nonce` was issued here and is still inside the window.
    pub async fn is_valid(&self, nonce: &str) -> bool {
        if self.window.is_zero() {
            return false;
        }
        self.nonces.get(nonce).await.is_some()
    }

    /// Applies pending expirations and evictions now rather than on the
    /// cache's own schedule.
    pub async fn sweep(&self) {
        self.nonces.run_pending_tasks().await;
    }

    /// Number of nonces currently held.
    pub async fn len(&self) -> u64 {
        self.sweep().await;
        self.nonces.entry_count()
    }

    /// Whether the store holds no nonces.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_and_validate() {
        let store = NonceStore::new(Duration::from_secs(300));
        let nonce = store.issue().await;
        assert_eq!(nonce.len(), 32);
        assert!(store.is_valid(&nonce).await);
        assert!(store.is_valid(&nonce).await);
        assert!(!store.is_valid("forged").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_window_never_accepts() {
        let store = NonceStore::new(Duration::ZERO);
        let nonce = store.issue().await;
        assert!(!store.is_valid(&nonce).await);
    }

    #[tokio::test]
    async fn test_stale_nonce_expires() {
        let store = NonceStore::new(Duration::from_millis(50));
        let nonce = store.issue().await;
        assert!(store.is_valid(&nonce).await);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!store.is_valid(&nonce).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let store = NonceStore::with_capacity(Duration::from_secs(300), 4);
        let mut newest = String::new();
        for _ in 0..20 {
            newest = store.issue().await;
        }
        assert!(store.len().await <= 4);
        assert!(store.is_valid(&newest).await);
    }
}
