use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// A failed computation, shared verbatim with every caller that waited on it.
#[derive(Clone, Debug, Error)]
#[error("{0:#}")]
pub struct ComputeFailure(Arc<anyhow::Error>);

impl ComputeFailure {
    pub fn new(source: anyhow::Error) -> Self {
        Self(Arc::new(source))
    }

    pub fn source_error(&self) -> &anyhow::Error {
        &self.0
    }

    /// True when both handles point at the same underlying failure.
    pub fn same_failure(&self, other: &ComputeFailure) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

type Outcome<V> = Result<V, ComputeFailure>;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    seq: u64,
}

struct InFlight<V> {
    id: u64,
    outcome: watch::Receiver<Option<Outcome<V>>>,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Eviction order: oldest `created_at` first, insertion order on ties.
    by_age: BTreeMap<(Instant, u64), K>,
    in_flight: HashMap<K, InFlight<V>>,
    next_seq: u64,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn fresh(&mut self, key: &K, ttl: Duration, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.created_at) < ttl {
            return Some(entry.value.clone());
        }

        self.remove_entry(key);
        None
    }

    fn remove_entry(&mut self, key: &K) {
        if let Some(entry) = self.entries.remove(key) {
            self.by_age.remove(&(entry.created_at, entry.seq));
        }
    }

    /// Entries share one TTL, so expired ones sit at the front of `by_age`.
    fn purge_expired(&mut self, ttl: Duration, now: Instant) {
        while let Some((&(created_at, _), _)) = self.by_age.first_key_value() {
            if now.saturating_duration_since(created_at) < ttl {
                break;
            }
            if let Some((_, key)) = self.by_age.pop_first() {
                self.entries.remove(&key);
            }
        }
    }

    fn insert(&mut self, key: K, value: V, now: Instant, ttl: Duration, max_size: usize) {
        self.remove_entry(&key);
        self.purge_expired(ttl, now);

        let seq = self.next_seq();
        self.by_age.insert((now, seq), key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                seq,
            },
        );

        while self.entries.len() > max_size {
            let Some((_, evicted)) = self.by_age.pop_first() else {
                break;
            };
            self.entries.remove(&evicted);
        }
    }

    fn release(&mut self, key: &K, id: u64) -> bool {
        if self.in_flight.get(key).is_some_and(|flight| flight.id == id) {
            self.in_flight.remove(key);
            return true;
        }
        false
    }
}

enum Claim<V> {
    Hit(V),
    Wait(watch::Receiver<Option<Outcome<V>>>),
    Lead(watch::Sender<Option<Outcome<V>>>, u64),
}

/// Bounded, TTL-expiring map from scan key to result with single-flight
/// computation per key.
///
/// A zero `ttl` or `max_size` stores nothing, but concurrent callers for
/// the same key still share one in-progress computation.
pub struct ResultCache<K, V> {
    ttl: Duration,
    max_size: usize,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            ttl,
            max_size,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                by_age: BTreeMap::new(),
                in_flight: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn caching_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.max_size > 0
    }

    /// Unexpired value for `key`, if any. Expired entries are dropped on sight.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().fresh(key, self.ttl, Instant::now())
    }

    /// Return the cached value for `key`, or join/start the computation for it.
    ///
    /// Failures are never cached. If the caller leading a computation is
    /// dropped before it finishes, its waiters start over and one of them
    /// takes the lead.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> Result<V, ComputeFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let (sender, id) = loop {
            let mut receiver = match self.claim(&key) {
                Claim::Hit(value) => {
                    debug!(?key, "cache hit");
                    return Ok(value);
                }
                Claim::Wait(receiver) => receiver,
                Claim::Lead(sender, id) => break (sender, id),
            };

            debug!(?key, "joining in-flight computation");
            let outcome = receiver
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|published| (*published).clone());
            match outcome {
                Some(outcome) => return outcome,
                None => debug!(?key, "in-flight computation abandoned; retrying"),
            }
        };

        let guard = FlightGuard {
            cache: self,
            key: &key,
            id,
        };

        let outcome = compute().await.map_err(ComputeFailure::new);
        self.complete(&key, id, &outcome);
        drop(guard);

        // Waiters may all be gone already; that is fine.
        let _ = sender.send(Some(outcome.clone()));
        outcome
    }

    /// Drop any cached value and in-flight marker for `key`.
    ///
    /// A computation already running keeps serving the callers attached to
    /// it, but its result is not stored.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.lock();
        state.remove_entry(key);
        state.in_flight.remove(key);
    }

    /// Resident entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Check the cache, then the in-flight map, then register as leader, under one lock.
    fn claim(&self, key: &K) -> Claim<V> {
        let mut state = self.lock();

        if let Some(value) = state.fresh(key, self.ttl, Instant::now()) {
            return Claim::Hit(value);
        }

        if let Some(flight) = state.in_flight.get(key) {
            return Claim::Wait(flight.outcome.clone());
        }

        let id = state.next_seq();
        let (sender, receiver) = watch::channel(None);
        state.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                outcome: receiver,
            },
        );
        Claim::Lead(sender, id)
    }

    fn complete(&self, key: &K, id: u64, outcome: &Outcome<V>) {
        let mut state = self.lock();

        // An invalidate during the computation took our marker away.
        if !state.release(key, id) {
            return;
        }

        if let Ok(value) = outcome {
            if self.caching_enabled() {
                state.insert(key.clone(), value.clone(), Instant::now(), self.ttl, self.max_size);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the leader's in-flight marker on every exit path, cancellation included.
struct FlightGuard<'a, K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    cache: &'a ResultCache<K, V>,
    key: &'a K,
    id: u64,
}

impl<K, V> Drop for FlightGuard<'_, K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    fn drop(&mut self) {
        if self.cache.lock().release(self.key, self.id) {
            debug!(key = ?self.key, "released abandoned in-flight computation");
        }
    }
}
