use thiserror::Error;

/// Invalid settings rejected before a component is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("rate per minute must be a positive finite number, got {rate}")]
    InvalidRate { rate: f64 },

    #[error("cooldown window must be a non-negative number of seconds, got {seconds}")]
    InvalidCooldown { seconds: f64 },

    #[error("cache {field} must be non-negative, got {value}")]
    InvalidCacheBound { field: &'static str, value: String },

    #[error("toxicity threshold must be within 0.0..=1.0, got {threshold}")]
    InvalidThreshold { threshold: f64 },

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },
}
