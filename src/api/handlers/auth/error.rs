//! Error taxonomy for the auth service.
//!
//! Storage failures are logged and collapsed into a generic message so raw
//! database errors never reach clients.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use tracing::error;

use super::types::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Authentication required")]
    SessionInvalid,
    #[error("Too many attempts, retry after {}", reset_time.format("%H:%M"))]
    RateLimited { reset_time: DateTime<Utc> },
    #[error("User not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateEmail => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::SessionInvalid => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            Self::Storage(err) => {
                error!("Storage error: {err:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let reset_time = match &self {
            Self::RateLimited { reset_time } => Some(*reset_time),
            _ => None,
        };
        (status, Json(ErrorBody { message, reset_time })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use chrono::TimeZone;

    async fn body_of(err: AuthError) -> Result<ErrorBody> {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::SessionInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::RateLimited {
                reset_time: Utc::now()
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Storage(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn storage_error_does_not_leak_details() -> Result<()> {
        let body = body_of(AuthError::Storage(anyhow!("connection refused to db:5432"))).await?;
        assert_eq!(body.message, "Internal server error");
        assert!(body.reset_time.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rate_limited_carries_reset_time() -> Result<()> {
        let reset_time = Utc.with_ymd_and_hms(2025, 1, 1, 12, 30, 0).unwrap();
        let body = body_of(AuthError::RateLimited { reset_time }).await?;
        assert_eq!(body.reset_time, Some(reset_time));
        assert!(body.message.contains("12:30"));
        Ok(())
    }

    #[tokio::test]
    async fn credential_errors_share_one_message() -> Result<()> {
        let wrong_password = body_of(AuthError::InvalidCredentials).await?;
        let no_such_user = body_of(AuthError::InvalidCredentials).await?;
        assert_eq!(wrong_password.message, no_such_user.message);
        Ok(())
    }
}
