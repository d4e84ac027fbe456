// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Refresh policy
//!
//! - Keys are cached for a fixed TTL (300 seconds by default)
//! - Reading an unexpired key set is a lock-free load of an immutable snapshot
//! - The first caller after expiry refreshes; concurrent callers wait on the
//!   same refresh instead of issuing their own fetch (single-flight). This
//!   holds for failed refreshes too: callers that queued behind a failed
//!   attempt, or arrive within the retry backoff, reuse its outcome
//! - The key set is replaced as a whole, readers only ever see a complete
//!   snapshot
//! - On fetch failure the previous key set keeps being served until it is
//!   older than the maximum staleness bound, after which verification fails
//!   closed

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::Mutex;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default bound on how long a stale key set may be served after a failed refresh.
pub const DEFAULT_MAX_STALENESS: Duration = Duration::from_secs(3600);

/// Default timeout for the JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause after a failed fetch before the endpoint is tried again.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Immutable snapshot of the identity provider's signing keys.
#[derive(Debug)]
pub struct KeySet {
    pub keys: Vec<Jwk>,
    pub fetched_at: Instant,
}

impl KeySet {
    /// Find the key whose `kid` matches.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
    }

    fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

/// Outcome of the most recent failed fetch, guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    failed_at: Option<Instant>,
    last_error: String,
}

/// Cached view of the identity provider's JWKS endpoint.
pub struct KeyCache {
    jwks_url: String,
    cache_ttl: Duration,
    max_staleness: Duration,
    retry_backoff: Duration,
    current: ArcSwapOption<KeySet>,
    /// Serializes refreshes so one fetch happens per expiry window.
    refresh_lock: Mutex<RefreshState>,
    client: reqwest::Client,
}

impl KeyCache {
    /// Create a key cache for `jwks_url` with default TTL, staleness bound
    /// and fetch timeout.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::JwksUnavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(jwks_url, client))
    }

    /// Create a key cache that fetches with the given HTTP client.
    pub fn with_client(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            max_staleness: DEFAULT_MAX_STALENESS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(RefreshState::default()),
            client,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_staleness(mut self, max_staleness: Duration) -> Self {
        self.max_staleness = max_staleness;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Current key set, refreshing it first if the TTL has elapsed.
    pub async fn get_keys(&self) -> Result<Arc<KeySet>, AuthError> {
        if let Some(keys) = self.fresh_snapshot() {
            return Ok(keys);
        }

        let arrived = Instant::now();
        let mut state = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(keys) = self.fresh_snapshot() {
            return Ok(keys);
        }

        // A failed attempt that finished after we arrived, or one recent
        // enough to be inside the backoff, stands for this caller too.
        if let Some(failed_at) = state.failed_at {
            if failed_at >= arrived || failed_at.elapsed() < self.retry_backoff {
                let err = AuthError::JwksUnavailable(state.last_error.clone());
                return self.stale_fallback(err);
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => {
                state.failed_at = None;
                Ok(self.install(jwks))
            }
            Err(err) => {
                state.failed_at = Some(Instant::now());
                state.last_error = err.to_string();
                self.stale_fallback(err)
            }
        }
    }

    /// Check if a key set is cached and within its TTL.
    pub fn is_cached(&self) -> bool {
        self.fresh_snapshot().is_some()
    }

    fn fresh_snapshot(&self) -> Option<Arc<KeySet>> {
        self.current
            .load_full()
            .filter(|keys| keys.age() < self.cache_ttl)
    }

    fn install(&self, jwks: JwkSet) -> Arc<KeySet> {
        let keys = Arc::new(KeySet {
            keys: jwks.keys,
            fetched_at: Instant::now(),
        });
        self.current.store(Some(Arc::clone(&keys)));
        tracing::info!(
            jwks_url = %self.jwks_url,
            key_count = keys.keys.len(),
            "refreshed JWKS key set"
        );
        keys
    }

    fn stale_fallback(&self, err: AuthError) -> Result<Arc<KeySet>, AuthError> {
        match self.current.load_full() {
            Some(keys) if keys.age() < self.max_staleness => {
                tracing::warn!(
                    error = %err,
                    age_secs = keys.age().as_secs(),
                    "JWKS refresh failed, serving stale key set"
                );
                Ok(keys)
            }
            Some(_) => {
                tracing::warn!(error = %err, "JWKS refresh failed and cached key set is past its staleness bound");
                Err(err)
            }
            None => Err(err),
        }
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const PRIMARY_JWK: &str = include_str!("../../tests/fixtures/primary_jwk.json");

    fn jwks_body() -> String {
        format!(r#"{{"keys":[{PRIMARY_JWK}]}}"#)
    }

    async fn counting_server(counter: Arc<AtomicU32>) -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = mockito::Server::new_async().await;
        let body = jwks_body();
        let mock = server
            .mock("GET", "/jwks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                body.clone().into()
            })
            .create_async()
            .await;
        (server, mock)
    }

    #[test]
    fn custom_cache_ttl() {
        let cache = KeyCache::new("https://example.com/.well-known/jwks.json")
            .unwrap()
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(cache.cache_ttl, Duration::from_secs(60));
        assert_eq!(cache.jwks_url(), "https://example.com/.well-known/jwks.json");
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let cache = KeyCache::new("https://example.com/.well-known/jwks.json").unwrap();
        assert!(!cache.is_cached());
    }

    #[tokio::test]
    async fn serves_cached_keys_within_ttl() {
        let counter = Arc::new(AtomicU32::new(0));
        let (server, _mock) = counting_server(Arc::clone(&counter)).await;
        let cache = KeyCache::new(format!("{}/jwks", server.url())).unwrap();

        let first = cache.get_keys().await.unwrap();
        let second = cache.get_keys().await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.find("primary-key").is_some());
        assert!(first.find("other-key").is_none());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let counter = Arc::new(AtomicU32::new(0));
        let (server, _mock) = counting_server(Arc::clone(&counter)).await;
        let cache = Arc::new(KeyCache::new(format!("{}/jwks", server.url())).unwrap());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_keys().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    async fn failing_mock(server: &mut mockito::ServerGuard, counter: Arc<AtomicU32>) -> mockito::Mock {
        server
            .mock("GET", "/jwks")
            .with_status(500)
            .with_body_from_request(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                b"unavailable".to_vec()
            })
            .create_async()
            .await
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_failed_fetch() {
        let ok = Arc::new(AtomicU32::new(0));
        let (mut server, mock) = counting_server(Arc::clone(&ok)).await;
        let cache = Arc::new(
            KeyCache::new(format!("{}/jwks", server.url()))
                .unwrap()
                .with_cache_ttl(Duration::from_millis(20)),
        );
        let initial = cache.get_keys().await.unwrap();

        mock.remove_async().await;
        let failed = Arc::new(AtomicU32::new(0));
        let _failing = failing_mock(&mut server, Arc::clone(&failed)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_keys().await })
            })
            .collect();
        for task in tasks {
            let keys = task.await.unwrap().unwrap();
            assert!(Arc::ptr_eq(&keys, &initial));
        }

        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_after_backoff() {
        let mut server = mockito::Server::new_async().await;
        let failed = Arc::new(AtomicU32::new(0));
        let _failing = failing_mock(&mut server, Arc::clone(&failed)).await;
        let cache = KeyCache::new(format!("{}/jwks", server.url()))
            .unwrap()
            .with_retry_backoff(Duration::from_millis(50));

        assert!(cache.get_keys().await.is_err());
        assert!(cache.get_keys().await.is_err());
        assert_eq!(failed.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get_keys().await.is_err());
        assert_eq!(failed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_cache_refreshes_once_with_newer_timestamp() {
        let counter = Arc::new(AtomicU32::new(0));
        let (server, _mock) = counting_server(Arc::clone(&counter)).await;
        let cache = Arc::new(
            KeyCache::new(format!("{}/jwks", server.url()))
                .unwrap()
                .with_cache_ttl(Duration::from_millis(50)),
        );

        let initial = cache.get_keys().await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        let (a, b) = tokio::join!(cache.get_keys(), cache.get_keys());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.fetched_at > initial.fetched_at);
    }

    #[tokio::test]
    async fn serves_stale_keys_when_refresh_fails() {
        let counter = Arc::new(AtomicU32::new(0));
        let (server, mock) = counting_server(Arc::clone(&counter)).await;
        let cache = KeyCache::new(format!("{}/jwks", server.url()))
            .unwrap()
            .with_cache_ttl(Duration::from_millis(20));

        let initial = cache.get_keys().await.unwrap();
        mock.remove_async().await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        let stale = cache.get_keys().await.unwrap();
        assert!(Arc::ptr_eq(&initial, &stale));
    }

    #[tokio::test]
    async fn fails_closed_past_staleness_bound() {
        let counter = Arc::new(AtomicU32::new(0));
        let (server, mock) = counting_server(Arc::clone(&counter)).await;
        let cache = KeyCache::new(format!("{}/jwks", server.url()))
            .unwrap()
            .with_cache_ttl(Duration::from_millis(20))
            .with_max_staleness(Duration::from_millis(60));

        cache.get_keys().await.unwrap();
        mock.remove_async().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = cache.get_keys().await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn propagates_failure_without_cached_keys() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/jwks")
            .with_status(500)
            .create_async()
            .await;
        let cache = KeyCache::new(format!("{}/jwks", server.url())).unwrap();

        let err = cache.get_keys().await.unwrap_err();
        assert!(matches!(err, AuthError::JwksUnavailable(_)));
    }
}
