use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

use scanner_core::ConfigError;

/// Spaces permits at least `interval` apart, grant to grant.
///
/// The lock is held across the wait, so callers are admitted one at a time.
/// `last_permit` is only written after the wait completes; dropping an
/// `acquire` future mid-wait leaves it untouched.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_permit: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn per_minute(rate_per_minute: f64) -> Result<Self, ConfigError> {
        if !rate_per_minute.is_finite() || rate_per_minute <= 0.0 {
            return Err(ConfigError::InvalidRate {
                rate: rate_per_minute,
            });
        }

        let interval = Duration::try_from_secs_f64(60.0 / rate_per_minute).map_err(|_| {
            ConfigError::InvalidRate {
                rate: rate_per_minute,
            }
        })?;

        Ok(Self {
            interval,
            last_permit: Mutex::new(None),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next permit.
    pub async fn acquire(&self) {
        let mut last_permit = self.last_permit.lock().await;

        if let Some(previous) = *last_permit {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }

        *last_permit = Some(Instant::now());
    }
}
