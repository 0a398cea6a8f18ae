use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use scanner_core::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    Denied { remaining: Duration },
}

impl CooldownDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, CooldownDecision::Allowed)
    }
}

#[derive(Debug)]
struct CooldownState<K> {
    last_request: HashMap<K, Instant>,
    /// Accepted requests in arrival order. Entries whose identity has since
    /// been refreshed are stale and skipped when popped.
    expiry: VecDeque<(Instant, K)>,
}

/// Minimum spacing between accepted requests from the same identity.
///
/// Expired records are dropped lazily from the front of the expiry queue at
/// the start of every call, so memory tracks identities that are still
/// cooling down rather than every identity ever seen.
#[derive(Debug)]
pub struct CooldownTracker<K> {
    window: Duration,
    state: Mutex<CooldownState<K>>,
}

impl<K> CooldownTracker<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Mutex::new(CooldownState {
                last_request: HashMap::new(),
                expiry: VecDeque::new(),
            }),
        }
    }

    pub fn from_secs(window_seconds: f64) -> Result<Self, ConfigError> {
        if !window_seconds.is_finite() || window_seconds < 0.0 {
            return Err(ConfigError::InvalidCooldown {
                seconds: window_seconds,
            });
        }

        let window = Duration::try_from_secs_f64(window_seconds).map_err(|_| {
            ConfigError::InvalidCooldown {
                seconds: window_seconds,
            }
        })?;
        Ok(Self::new(window))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn try_acquire(&self, identity: &K, now: Instant) -> CooldownDecision {
        let mut state = self.lock();
        Self::expire(&mut state, self.window, now);

        if let Some(last) = state.last_request.get(identity) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.window {
                return CooldownDecision::Denied {
                    remaining: self.window - elapsed,
                };
            }
        }

        state.last_request.insert(identity.clone(), now);
        state.expiry.push_back((now, identity.clone()));
        CooldownDecision::Allowed
    }

    /// Run the lazy expiry step on its own; returns how many records were dropped.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut state = self.lock();
        Self::expire(&mut state, self.window, now)
    }

    /// Identities currently holding a record.
    pub fn len(&self) -> usize {
        self.lock().last_request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries waiting in the expiry queue, stale ones included.
    pub fn queued(&self) -> usize {
        self.lock().expiry.len()
    }

    fn expire(state: &mut CooldownState<K>, window: Duration, now: Instant) -> usize {
        let mut removed = 0;

        while let Some((stamp, _)) = state.expiry.front() {
            if now.saturating_duration_since(*stamp) < window {
                break;
            }

            let Some((stamp, identity)) = state.expiry.pop_front() else {
                break;
            };

            // A newer stamp means the identity was refreshed; its own queue entry expires it later.
            if state.last_request.get(&identity) == Some(&stamp) {
                state.last_request.remove(&identity);
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, remaining = state.last_request.len(), "expired cooldown records");
        }

        removed
    }

    fn lock(&self) -> MutexGuard<'_, CooldownState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::{CooldownDecision, CooldownTracker};
    use scanner_core::ConfigError;

    const WINDOW: Duration = Duration::from_secs(30);

    #[test]
    fn allows_denies_then_allows_again() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();

        assert_eq!(tracker.try_acquire(&1_u64, t0), CooldownDecision::Allowed);
        assert_eq!(
            tracker.try_acquire(&1_u64, t0 + WINDOW / 2),
            CooldownDecision::Denied {
                remaining: WINDOW / 2
            }
        );
        assert!(
            tracker
                .try_acquire(&1_u64, t0 + WINDOW + Duration::from_millis(1))
                .is_allowed()
        );
    }

    #[test]
    fn denial_does_not_refresh_the_record() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();

        assert!(tracker.try_acquire(&"mod", t0).is_allowed());
        assert!(!tracker.try_acquire(&"mod", t0 + Duration::from_secs(29)).is_allowed());
        assert!(tracker.try_acquire(&"mod", t0 + WINDOW).is_allowed());
        assert_eq!(tracker.queued(), 1);
    }

    #[test]
    fn identities_are_independent() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();

        assert!(tracker.try_acquire(&1_u64, t0).is_allowed());
        assert!(tracker.try_acquire(&2_u64, t0).is_allowed());
        assert!(!tracker.try_acquire(&1_u64, t0 + Duration::from_secs(1)).is_allowed());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn stale_queue_entries_do_not_remove_refreshed_records() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();
        let refreshed_at = t0 + WINDOW;

        assert!(tracker.try_acquire(&7_u64, t0).is_allowed());
        // The first queue entry expires here and matches, so it is dropped before the refresh.
        assert!(tracker.try_acquire(&7_u64, refreshed_at).is_allowed());
        assert_eq!(tracker.len(), 1);

        // Simulate the refresh racing ahead of expiry: refresh without an intervening purge.
        let tracker = CooldownTracker::new(WINDOW);
        assert!(tracker.try_acquire(&7_u64, t0).is_allowed());
        {
            let mut state = tracker.lock();
            state.last_request.insert(7, refreshed_at);
            state.expiry.push_back((refreshed_at, 7));
        }

        assert_eq!(tracker.purge_expired(t0 + WINDOW + Duration::from_secs(1)), 0);
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.try_acquire(&7_u64, refreshed_at + Duration::from_secs(5)).is_allowed());

        assert_eq!(tracker.purge_expired(refreshed_at + WINDOW), 1);
        assert!(tracker.is_empty());
        assert_eq!(tracker.queued(), 0);
    }

    #[test]
    fn memory_drains_after_window_for_many_identities() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();

        for id in 0..10_000_u64 {
            let now = t0 + Duration::from_micros(id);
            assert!(tracker.try_acquire(&id, now).is_allowed());
        }
        assert_eq!(tracker.len(), 10_000);

        // Halfway through the window nothing is eligible yet.
        assert_eq!(tracker.purge_expired(t0 + WINDOW / 2), 0);

        assert_eq!(tracker.purge_expired(t0 + WINDOW * 2), 10_000);
        assert!(tracker.is_empty());
        assert_eq!(tracker.queued(), 0);
    }

    #[test]
    fn repeated_requests_keep_queue_bounded() {
        let tracker = CooldownTracker::new(WINDOW);
        let t0 = Instant::now();

        for step in 0..1_000_u32 {
            let _ = tracker.try_acquire(&"spammer", t0 + Duration::from_secs(u64::from(step)));
        }

        // Accepted requests are 30s apart, and each one retires the previous entry.
        assert_eq!(tracker.len(), 1);
        assert!(tracker.queued() <= 1);
    }

    #[test]
    fn zero_window_never_denies() {
        let tracker = CooldownTracker::new(Duration::ZERO);
        let t0 = Instant::now();

        assert!(tracker.try_acquire(&1_u64, t0).is_allowed());
        assert!(tracker.try_acquire(&1_u64, t0).is_allowed());
        assert!(tracker.len() <= 1);
    }

    #[test]
    fn rejects_negative_window() {
        assert!(matches!(
            CooldownTracker::<u64>::from_secs(-1.0),
            Err(ConfigError::InvalidCooldown { .. })
        ));
        let tracker = CooldownTracker::<u64>::from_secs(2.5).unwrap();
        assert_eq!(tracker.window(), Duration::from_millis(2500));
    }
}
