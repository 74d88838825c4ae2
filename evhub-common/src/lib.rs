//! # evhub Common Library
//!
//! Shared code for the evhub crates:
//! - Error type and result alias
//! - Configuration loading (TOML file + environment overrides)
//! - Timestamp helpers
//! - Rate-limited warning log
//! - Outbound request throttle

pub mod config;
pub mod error;
pub mod rate_limited_log;
pub mod throttle;
pub mod time;

pub use error::{Error, Result};
pub use rate_limited_log::RateLimitedLog;
pub use throttle::RequestThrottle;
