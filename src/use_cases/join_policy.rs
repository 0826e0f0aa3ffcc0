// External capability checks a join must pass once past capacity/kick: follow,
// subscribe, ban. Order and semantics from the engine's join policy: capacity,
// kick, follow, subscribe, ban. Network errors surface unchanged rather than
// being folded into a refusal.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::player::UserId;
use crate::use_cases::types::JoinError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn check_user_follows(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError>;
    async fn check_user_subscription(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError>;
    async fn check_user_banned(&self, user: &str, channel_owner: &str) -> Result<Option<bool>, UpstreamError>;
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("identity provider upstream error: {0}")]
pub struct UpstreamError(pub String);

const CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Hash, Eq, PartialEq, Clone)]
enum CacheKind {
    Follow,
    Subscribe,
    Ban,
}

type CacheKey = (CacheKind, UserId, UserId);

/// TTL-memoized wrapper around an `IdentityProvider`, since every join
/// attempt runs the full check set and the provider is a network hop.
pub struct CachedIdentityProvider<P> {
    inner: P,
    cache: Mutex<HashMap<CacheKey, (Instant, bool)>>,
}

impl<P: IdentityProvider> CachedIdentityProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner, cache: Mutex::new(HashMap::new()) }
    }

    async fn cached_check<F, Fut>(&self, kind: CacheKind, user: &UserId, owner: &UserId, check: F) -> Result<Option<bool>, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Option<bool>, UpstreamError>>,
    {
        let key = (kind, owner.clone(), user.clone());
        if let Some((stamp, value)) = self.cache.lock().unwrap().get(&key)
            && stamp.elapsed() < CACHE_TTL {
                return Ok(Some(*value));
            }
        let result = check().await?;
        if let Some(value) = result {
            self.cache.lock().unwrap().insert(key, (Instant::now(), value));
        }
        Ok(result)
    }

    pub async fn follows(&self, user: &UserId, owner: &UserId) -> Result<Option<bool>, UpstreamError> {
        self.cached_check(CacheKind::Follow, user, owner, || self.inner.check_user_follows(user, owner)).await
    }

    pub async fn subscribed(&self, user: &UserId, owner: &UserId) -> Result<Option<bool>, UpstreamError> {
        self.cached_check(CacheKind::Subscribe, user, owner, || self.inner.check_user_subscription(user, owner)).await
    }

    pub async fn banned(&self, user: &UserId, owner: &UserId) -> Result<Option<bool>, UpstreamError> {
        self.cached_check(CacheKind::Ban, user, owner, || self.inner.check_user_banned(user, owner)).await
    }
}

/// Runs the follow/subscribe/ban portion of the join policy (capacity and
/// kick are checked by the caller against lobby state directly, since they
/// don't need an external collaborator).
pub async fn check_external_policy<P: IdentityProvider>(
    provider: &CachedIdentityProvider<P>,
    user: &UserId,
    owner: &UserId,
    followers_only: bool,
    subscribers_only: bool,
) -> Result<(), JoinError> {
    if followers_only {
        match provider.follows(user, owner).await {
            Ok(Some(true)) => {}
            Ok(_) => return Err(JoinError::FollowersOnly),
            Err(_) => return Err(JoinError::UpstreamUnavailable),
        }
    }
    if subscribers_only {
        match provider.subscribed(user, owner).await {
            Ok(Some(true)) => {}
            Ok(_) => return Err(JoinError::SubscribersOnly),
            Err(_) => return Err(JoinError::UpstreamUnavailable),
        }
    }
    match provider.banned(user, owner).await {
        Ok(Some(true)) => Err(JoinError::Banned),
        Ok(_) => Ok(()),
        Err(_) => Err(JoinError::UpstreamUnavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn check_user_follows(&self, _user: &str, _owner: &str) -> Result<Option<bool>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(true))
        }
        async fn check_user_subscription(&self, _user: &str, _owner: &str) -> Result<Option<bool>, UpstreamError> {
            Ok(Some(true))
        }
        async fn check_user_banned(&self, _user: &str, _owner: &str) -> Result<Option<bool>, UpstreamError> {
            Ok(Some(false))
        }
    }

    #[tokio::test]
    async fn follow_checks_are_memoized() {
        let provider = CachedIdentityProvider::new(CountingProvider { calls: AtomicUsize::new(0) });
        let user: UserId = "u1".into();
        let owner: UserId = "owner".into();
        provider.follows(&user, &owner).await.unwrap();
        provider.follows(&user, &owner).await.unwrap();
        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
    }
}
