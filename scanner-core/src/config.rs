use std::env;
use std::time::Duration;

use scanner_utils::parse::parse_duration;

use crate::error::ConfigError;

pub const DEFAULT_RATE_PER_MINUTE: f64 = 60.0;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_CACHE_MAX_SIZE: usize = 100;
pub const DEFAULT_COOLDOWN_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_TOXICITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_COMMENT_LIMIT: usize = 50;
pub const DEFAULT_POST_LIMIT: usize = 20;
pub const DEFAULT_MAX_USERNAME_LENGTH: usize = 50;

/// Settings shared by the scan core and its two frontends.
#[derive(Clone, Debug, PartialEq)]
pub struct ScannerConfig {
    pub rate_per_minute: f64,
    pub cache_ttl: Duration,
    pub cache_max_size: usize,
    pub cooldown_window: Duration,
    pub scan_timeout: Duration,
    pub toxicity_threshold: f64,
    pub comment_limit: usize,
    pub post_limit: usize,
    pub max_username_length: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rate_per_minute: DEFAULT_RATE_PER_MINUTE,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            cooldown_window: DEFAULT_COOLDOWN_WINDOW,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            toxicity_threshold: DEFAULT_TOXICITY_THRESHOLD,
            comment_limit: DEFAULT_COMMENT_LIMIT,
            post_limit: DEFAULT_POST_LIMIT,
            max_username_length: DEFAULT_MAX_USERNAME_LENGTH,
        }
    }
}

impl ScannerConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let rate_per_minute = match get("PERSPECTIVE_RATE_PER_MIN") {
            Some(raw) => parse_f64("PERSPECTIVE_RATE_PER_MIN", &raw)?,
            None => defaults.rate_per_minute,
        };

        let cache_ttl = match get("SCAN_CACHE_TTL") {
            Some(raw) => duration_value("SCAN_CACHE_TTL", &raw).map_err(|err| {
                negative_seconds(&raw).map_or(err, |_| ConfigError::InvalidCacheBound {
                    field: "ttl",
                    value: raw.clone(),
                })
            })?,
            None => defaults.cache_ttl,
        };

        let cache_max_size = match get("SCAN_CACHE_MAX_SIZE") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if value < 0 => {
                    return Err(ConfigError::InvalidCacheBound {
                        field: "max_size",
                        value: raw,
                    });
                }
                _ => parse_usize("SCAN_CACHE_MAX_SIZE", &raw)?,
            },
            None => defaults.cache_max_size,
        };

        let cooldown_window = match get("SCAN_COOLDOWN") {
            Some(raw) => duration_value("SCAN_COOLDOWN", &raw).map_err(|err| {
                negative_seconds(&raw)
                    .map_or(err, |seconds| ConfigError::InvalidCooldown { seconds })
            })?,
            None => defaults.cooldown_window,
        };

        let scan_timeout = match get("SCAN_TIMEOUT") {
            Some(raw) => duration_value("SCAN_TIMEOUT", &raw)?,
            None => defaults.scan_timeout,
        };

        let toxicity_threshold = match get("TOXICITY_THRESHOLD") {
            Some(raw) => parse_f64("TOXICITY_THRESHOLD", &raw)?,
            None => defaults.toxicity_threshold,
        };

        let config = Self {
            rate_per_minute,
            cache_ttl,
            cache_max_size,
            cooldown_window,
            scan_timeout,
            toxicity_threshold,
            comment_limit: optional_usize(&get, "REDDIT_COMMENT_LIMIT", defaults.comment_limit)?,
            post_limit: optional_usize(&get, "REDDIT_POST_LIMIT", defaults.post_limit)?,
            max_username_length: optional_usize(
                &get,
                "MAX_USERNAME_LENGTH",
                defaults.max_username_length,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate_per_minute.is_finite() || self.rate_per_minute <= 0.0 {
            return Err(ConfigError::InvalidRate {
                rate: self.rate_per_minute,
            });
        }

        if !(0.0..=1.0).contains(&self.toxicity_threshold) {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.toxicity_threshold,
            });
        }

        Ok(())
    }
}

fn parse_f64(key: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
    })
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
    })
}

fn optional_usize<G>(get: &G, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| parse_usize(key, &raw))
}

fn duration_value(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    parse_duration(raw).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
    })
}

fn negative_seconds(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| *value < 0.0)
}
