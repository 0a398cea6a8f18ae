//! Concurrency and resource control shared by every scan path: outbound call
//! pacing, result caching with single-flight, and per-requester cooldowns.

pub mod cache;
pub mod cooldown;
pub mod rate_limiter;

pub use cache::{ComputeFailure, ResultCache};
pub use cooldown::{CooldownDecision, CooldownTracker};
pub use rate_limiter::RateLimiter;
