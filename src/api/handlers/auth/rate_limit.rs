//! Database-backed rate limiting for signup and login.
//!
//! Attempts are tracked per (client IP, action) in the `auth_attempts` table
//! and counted over a rolling window. Window entries age out lazily; nothing
//! sweeps old rows. Using the database keeps limits synchronized across
//! service instances.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::state::RatePolicy;

#[derive(Clone, Copy, Debug)]
pub(crate) enum RateLimitAction {
    Signup,
    Login,
}

impl RateLimitAction {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RateLimitDecision {
    Allowed,
    Limited { reset_time: DateTime<Utc> },
}

/// Admission check run before a sensitive action proceeds.
///
/// Counts attempts in `[now - window, now]`; the boundary is inclusive of now
/// and exclusive of anything older than the window start. `reset_time` is
/// when the oldest counted attempt leaves the window and capacity frees up.
pub(super) async fn check_rate_limit(
    pool: &PgPool,
    client_ip: &str,
    action: RateLimitAction,
    policy: RatePolicy,
) -> Result<RateLimitDecision> {
    let query = r"
        SELECT COUNT(*) AS attempts, MIN(created_at) AS oldest
        FROM auth_attempts
        WHERE client_ip = $1
          AND action = $2
          AND created_at >= NOW() - ($3 * INTERVAL '1 second')
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(client_ip)
        .bind(action.as_str())
        .bind(i64::try_from(policy.window().as_secs()).unwrap_or(i64::MAX))
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to count attempts")?;

    let attempts: i64 = row.get("attempts");
    let oldest: Option<DateTime<Utc>> = row.get("oldest");

    Ok(decide(attempts, oldest, policy))
}

/// Append an attempt record; both failed and successful attempts count, so
/// credential stuffing is not free after one success.
pub(super) async fn record_attempt(
    pool: &PgPool,
    client_ip: &str,
    action: RateLimitAction,
    user_id: Option<Uuid>,
    success: bool,
) -> Result<()> {
    let query = r"
        INSERT INTO auth_attempts (client_ip, action, user_id, success)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(client_ip)
        .bind(action.as_str())
        .bind(user_id)
        .bind(success)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to record attempt")?;
    Ok(())
}

fn decide(attempts: i64, oldest: Option<DateTime<Utc>>, policy: RatePolicy) -> RateLimitDecision {
    if attempts < policy.limit() {
        return RateLimitDecision::Allowed;
    }
    let window =
        chrono::Duration::from_std(policy.window()).unwrap_or_else(|_| chrono::Duration::zero());
    // With no oldest attempt recorded the window is empty; fall back to now.
    let reset_time = oldest.map_or_else(Utc::now, |oldest| oldest + window);
    RateLimitDecision::Limited { reset_time }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn login_policy() -> RatePolicy {
        RatePolicy::new(5, Duration::from_secs(15 * 60))
    }

    #[test]
    fn action_names_match_stored_values() {
        assert_eq!(RateLimitAction::Signup.as_str(), "signup");
        assert_eq!(RateLimitAction::Login.as_str(), "login");
    }

    #[test]
    fn under_limit_is_allowed() {
        let oldest = Some(Utc::now() - chrono::Duration::minutes(10));
        assert_eq!(
            decide(4, oldest, login_policy()),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn at_limit_is_rejected_with_future_reset() {
        let now = Utc::now();
        let oldest = now - chrono::Duration::minutes(10);
        match decide(5, Some(oldest), login_policy()) {
            RateLimitDecision::Limited { reset_time } => {
                assert_eq!(reset_time, oldest + chrono::Duration::minutes(15));
                assert!(reset_time > now);
            }
            RateLimitDecision::Allowed => panic!("expected Limited"),
        }
    }

    #[test]
    fn reset_time_is_oldest_attempt_plus_window() {
        let oldest = Utc::now() - chrono::Duration::minutes(1);
        match decide(7, Some(oldest), login_policy()) {
            RateLimitDecision::Limited { reset_time } => {
                assert_eq!(reset_time, oldest + chrono::Duration::minutes(15));
            }
            RateLimitDecision::Allowed => panic!("expected Limited"),
        }
    }

    #[test]
    fn zero_limit_rejects_even_with_empty_window() {
        let policy = RatePolicy::new(0, Duration::from_secs(60));
        assert!(matches!(
            decide(0, None, policy),
            RateLimitDecision::Limited { .. }
        ));
    }
}
