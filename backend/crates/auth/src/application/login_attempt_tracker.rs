//! Login Attempt Tracker
//!
//! Records every login attempt and reads back recent history for the
//! lockout policy. An optional TTL cache sits in front of history reads made
//! through [`LoginAttemptTracker::recent_attempts`]; lockout decisions always
//! go to the store.
//!
//! Every `record` bumps a generation counter before dropping the cached
//! entry. A read only fills the cache if no `record` happened while it was
//! in flight, so a slow read can never put stale history back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::application::config::AuthConfig;
use crate::application::upstream::with_timeout;
use crate::domain::entity::login_attempt::LoginAttempt;
use crate::domain::repository::LoginAttemptRepository;
use crate::domain::value_object::lockout_policy::LockoutDecision;
use crate::error::AuthResult;

/// Upper bound on attempts read per identifier
const MAX_HISTORY: usize = 50;

struct CachedAttempts {
    attempts: Arc<Vec<LoginAttempt>>,
    cached_at: Instant,
}

/// Bounded TTL cache keyed by identifier
struct AttemptCache {
    entries: DashMap<String, CachedAttempts>,
    generation: AtomicU64,
    ttl: Duration,
    capacity: usize,
}

impl AttemptCache {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl,
            capacity,
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn get(&self, identifier: &str) -> Option<Arc<Vec<LoginAttempt>>> {
        let entry = self.entries.get(identifier)?;
        if entry.cached_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(identifier);
            return None;
        }
        Some(Arc::clone(&entry.attempts))
    }

    /// Store `attempts` unless a write happened since `read_generation`
    fn insert(&self, identifier: &str, read_generation: u64, attempts: Arc<Vec<LoginAttempt>>) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(identifier) {
            self.entries.retain(|_, v| v.cached_at.elapsed() <= self.ttl);
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }

        // The shard lock is held across the check, so an invalidation either
        // sees the new entry or is seen by the check
        let entry = self.entries.entry(identifier.to_string());
        if self.generation() != read_generation {
            return;
        }
        entry.insert(CachedAttempts {
            attempts,
            cached_at: Instant::now(),
        });
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.cached_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    fn invalidate(&self, identifier: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(identifier);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct LoginAttemptTracker<L>
where
    L: LoginAttemptRepository,
{
    attempts: Arc<L>,
    config: Arc<AuthConfig>,
    cache: Option<AttemptCache>,
}

impl<L> LoginAttemptTracker<L>
where
    L: LoginAttemptRepository,
{
    pub fn new(attempts: Arc<L>, config: Arc<AuthConfig>) -> Self {
        let cache = (config.attempt_cache_capacity > 0)
            .then(|| AttemptCache::new(config.attempt_cache_ttl, config.attempt_cache_capacity));
        Self {
            attempts,
            config,
            cache,
        }
    }

    /// Append an attempt
    pub async fn record(
        &self,
        identifier: &str,
        success: bool,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let attempt = LoginAttempt::new(identifier, success, at);
        let result = with_timeout(
            self.config.upstream_timeout,
            "login attempt append",
            self.attempts.append(&attempt),
        )
        .await;

        // Invalidate even on failure; the append may have landed
        if let Some(cache) = &self.cache {
            cache.invalidate(identifier);
        }

        result?;
        tracing::debug!(success, "Recorded login attempt");
        Ok(())
    }

    /// Attempts inside the lockout window, newest first
    pub async fn recent_attempts(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Arc<Vec<LoginAttempt>>> {
        let Some(cache) = &self.cache else {
            return self.load(identifier, now).await.map(Arc::new);
        };
        if let Some(cached) = cache.get(identifier) {
            return Ok(cached);
        }

        let read_generation = cache.generation();
        let attempts = Arc::new(self.load(identifier, now).await?);
        cache.insert(identifier, read_generation, Arc::clone(&attempts));

        Ok(attempts)
    }

    /// Apply the configured lockout policy to recent history
    pub async fn lockout_status(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<LockoutDecision> {
        if self.config.lockout.max_failures == 0 {
            return Ok(LockoutDecision::Allowed);
        }
        let attempts = self.load(identifier, now).await?;
        Ok(self.config.lockout.evaluate(&attempts, now))
    }

    async fn load(&self, identifier: &str, now: DateTime<Utc>) -> AuthResult<Vec<LoginAttempt>> {
        let since = now - self.config.lockout.window;
        with_timeout(
            self.config.upstream_timeout,
            "login attempt lookup",
            self.attempts.find_recent(identifier, since, MAX_HISTORY),
        )
        .await
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, AttemptCache::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryAuthRepository;
    use crate::test_support::test_config;
    use chrono::Duration as ChronoDuration;

    /// Returns what the store held when the read started, after a delay
    #[derive(Clone)]
    struct SlowReads {
        inner: InMemoryAuthRepository,
        delay: Duration,
    }

    impl LoginAttemptRepository for SlowReads {
        async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()> {
            self.inner.append(attempt).await
        }

        async fn find_recent(
            &self,
            identifier: &str,
            since: DateTime<Utc>,
            limit: usize,
        ) -> AuthResult<Vec<LoginAttempt>> {
            let attempts = self.inner.find_recent(identifier, since, limit).await?;
            tokio::time::sleep(self.delay).await;
            Ok(attempts)
        }
    }

    async fn record_failures(tracker: &LoginAttemptTracker<SlowReads>, count: i64) {
        let now = Utc::now();
        for i in 0..count {
            tracker
                .record("u@x.com", false, now - ChronoDuration::seconds(i + 1))
                .await
                .unwrap();
        }
    }

    fn tracker_with(
        config: AuthConfig,
    ) -> (LoginAttemptTracker<InMemoryAuthRepository>, InMemoryAuthRepository) {
        let repo = InMemoryAuthRepository::new();
        (
            LoginAttemptTracker::new(Arc::new(repo.clone()), Arc::new(config)),
            repo,
        )
    }

    #[tokio::test]
    async fn test_record_and_read_newest_first() {
        let (tracker, _) = tracker_with(test_config());
        let now = Utc::now();

        tracker
            .record("u@x.com", false, now - ChronoDuration::seconds(20))
            .await
            .unwrap();
        tracker
            .record("u@x.com", true, now - ChronoDuration::seconds(10))
            .await
            .unwrap();
        tracker.record("u@x.com", false, now).await.unwrap();

        let attempts = tracker.recent_attempts("u@x.com", now).await.unwrap();
        let flags: Vec<bool> = attempts.iter().map(|a| a.success).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_record_invalidates_cache() {
        let (tracker, _) = tracker_with(test_config());
        let now = Utc::now();

        tracker.record("u@x.com", false, now).await.unwrap();
        assert_eq!(tracker.recent_attempts("u@x.com", now).await.unwrap().len(), 1);
        assert_eq!(tracker.cached_len(), 1);

        tracker.record("u@x.com", false, now).await.unwrap();
        assert_eq!(tracker.cached_len(), 0);
        assert_eq!(tracker.recent_attempts("u@x.com", now).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_serves_reads_until_expiry() {
        let mut config = test_config();
        config.attempt_cache_ttl = Duration::from_millis(30);
        let (tracker, repo) = tracker_with(config);
        let now = Utc::now();

        assert!(tracker.recent_attempts("u@x.com", now).await.unwrap().is_empty());

        // Written behind the tracker's back
        repo.append(&LoginAttempt::new("u@x.com", false, now)).await.unwrap();
        assert!(tracker.recent_attempts("u@x.com", now).await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tracker.recent_attempts("u@x.com", now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_capacity_is_bounded() {
        let mut config = test_config();
        config.attempt_cache_capacity = 2;
        let (tracker, _) = tracker_with(config);
        let now = Utc::now();

        for id in ["a@x.com", "b@x.com", "c@x.com"] {
            tracker.recent_attempts(id, now).await.unwrap();
        }
        assert_eq!(tracker.cached_len(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_cache() {
        let mut config = test_config();
        config.attempt_cache_capacity = 0;
        let (tracker, repo) = tracker_with(config);
        let now = Utc::now();

        tracker.recent_attempts("u@x.com", now).await.unwrap();
        repo.append(&LoginAttempt::new("u@x.com", false, now)).await.unwrap();
        assert_eq!(tracker.recent_attempts("u@x.com", now).await.unwrap().len(), 1);
        assert_eq!(tracker.cached_len(), 0);
    }

    #[tokio::test]
    async fn test_lockout_status() {
        let (tracker, _) = tracker_with(test_config());
        let now = Utc::now();

        for i in 0..4 {
            tracker
                .record("u@x.com", false, now - ChronoDuration::seconds(i))
                .await
                .unwrap();
        }
        assert_eq!(
            tracker.lockout_status("u@x.com", now).await.unwrap(),
            LockoutDecision::Allowed
        );

        tracker.record("u@x.com", false, now).await.unwrap();
        assert!(tracker.lockout_status("u@x.com", now).await.unwrap().is_locked());
        assert_eq!(
            tracker.lockout_status("v@x.com", now).await.unwrap(),
            LockoutDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_write_during_slow_read_is_not_masked_by_cache() {
        let store = SlowReads {
            inner: InMemoryAuthRepository::new(),
            delay: Duration::from_millis(100),
        };
        let tracker = LoginAttemptTracker::new(Arc::new(store), Arc::new(test_config()));
        record_failures(&tracker, 4).await;

        let now = Utc::now();
        let (stale, recorded) = tokio::join!(tracker.recent_attempts("u@x.com", now), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tracker.record("u@x.com", false, now).await
        });
        recorded.unwrap();
        assert_eq!(stale.unwrap().len(), 4);

        assert_eq!(tracker.cached_len(), 0);
        assert_eq!(tracker.recent_attempts("u@x.com", now).await.unwrap().len(), 5);
        assert!(tracker.lockout_status("u@x.com", now).await.unwrap().is_locked());
    }

    #[tokio::test]
    async fn test_lockout_status_reads_past_a_cached_history() {
        let (tracker, repo) = tracker_with(test_config());
        let now = Utc::now();

        assert!(tracker.recent_attempts("u@x.com", now).await.unwrap().is_empty());
        assert_eq!(tracker.cached_len(), 1);

        for i in 0..5 {
            repo.append(&LoginAttempt::new("u@x.com", false, now - ChronoDuration::seconds(i)))
                .await
                .unwrap();
        }
        assert!(tracker.recent_attempts("u@x.com", now).await.unwrap().is_empty());
        assert!(tracker.lockout_status("u@x.com", now).await.unwrap().is_locked());
    }
}
