//! Auth configuration and shared per-process state.

use anyhow::{Context, Result};
use std::time::Duration;

use super::password::hash_password;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_SIGNUP_LIMIT: i64 = 3;
const DEFAULT_SIGNUP_WINDOW: Duration = Duration::from_secs(60 * 60);
const DEFAULT_LOGIN_LIMIT: i64 = 5;
const DEFAULT_LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Minimum requirements a new password must meet.
#[derive(Clone, Copy, Debug)]
pub struct PasswordPolicy {
    min_length: usize,
    require_mixed_case: bool,
    require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_mixed_case: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    #[must_use]
    pub fn with_require_mixed_case(mut self, require: bool) -> Self {
        self.require_mixed_case = require;
        self
    }

    #[must_use]
    pub fn with_require_digit(mut self, require: bool) -> Self {
        self.require_digit = require;
        self
    }

    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    #[must_use]
    pub fn require_mixed_case(&self) -> bool {
        self.require_mixed_case
    }

    #[must_use]
    pub fn require_digit(&self) -> bool {
        self.require_digit
    }
}

/// Attempt limit over a rolling window, supplied by the caller per action.
#[derive(Clone, Copy, Debug)]
pub struct RatePolicy {
    limit: i64,
    window: Duration,
}

impl RatePolicy {
    #[must_use]
    pub fn new(limit: i64, window: Duration) -> Self {
        Self { limit, window }
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
    password_policy: PasswordPolicy,
    signup_limit: RatePolicy,
    login_limit: RatePolicy,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            password_policy: PasswordPolicy::default(),
            signup_limit: RatePolicy::new(DEFAULT_SIGNUP_LIMIT, DEFAULT_SIGNUP_WINDOW),
            login_limit: RatePolicy::new(DEFAULT_LOGIN_LIMIT, DEFAULT_LOGIN_WINDOW),
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    #[must_use]
    pub fn with_signup_limit(mut self, policy: RatePolicy) -> Self {
        self.signup_limit = policy;
        self
    }

    #[must_use]
    pub fn with_login_limit(mut self, policy: RatePolicy) -> Self {
        self.login_limit = policy;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn password_policy(&self) -> PasswordPolicy {
        self.password_policy
    }

    #[must_use]
    pub fn signup_limit(&self) -> RatePolicy {
        self.signup_limit
    }

    #[must_use]
    pub fn login_limit(&self) -> RatePolicy {
        self.login_limit
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Shared auth state attached to the router as an `Extension`.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    dummy_hash: String,
}

impl AuthState {
    /// Build the auth state, pre-computing a dummy password hash.
    ///
    /// The dummy hash keeps login timing flat when the email does not exist:
    /// the handler verifies the presented password against it anyway.
    ///
    /// # Errors
    /// Returns an error if the dummy hash cannot be computed.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let dummy_hash = hash_password("conceptcraft-timing-equalizer")
            .context("failed to compute dummy password hash")?;
        Ok(Self { config, dummy_hash })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}
