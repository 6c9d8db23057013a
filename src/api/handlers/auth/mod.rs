//! Auth handlers and supporting modules.
//!
//! This module coordinates credential verification, session management, and
//! per-IP rate limiting.
//!
//! ## Rate Limiting
//!
//! Signup and login are gated by an admission check before any credential
//! work happens. Attempts are tracked per (client IP, action) in the
//! database, so limits hold across service instances:
//!
//! - **Signup:** 3 attempts per hour.
//! - **Login:** 5 attempts per 15 minutes.
//!
//! Both limits are configuration, not hardcoded in the limiter.
//!
//! ## Sessions
//!
//! Session tokens are 32 bytes of OS randomness; the database stores only a
//! SHA-256 hash. TTL is fixed at creation (default 15 minutes) and never
//! extended by activity. Expiry is checked lazily at validation time.

mod error;
pub(crate) mod login;
mod password;
mod rate_limit;
pub(crate) mod session;
pub(crate) mod signup;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

#[cfg(test)]
mod tests;

pub use error::AuthError;
pub use state::{AuthConfig, AuthState, PasswordPolicy, RatePolicy};
