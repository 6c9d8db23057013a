//! Request/response types for auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Error body returned for every non-2xx auth response.
///
/// `reset_time` is only present on 429 so clients can back off precisely.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn signup_request_round_trips() -> Result<()> {
        let request = SignupRequest {
            email: "alice@example.com".to_string(),
            password: "Secret123".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: SignupRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "Secret123");
        Ok(())
    }

    #[test]
    fn auth_response_omits_absent_user() -> Result<()> {
        let response = AuthResponse {
            message: "Account created".to_string(),
            user: None,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("user").is_none());
        Ok(())
    }

    #[test]
    fn user_response_omits_absent_last_login() -> Result<()> {
        let response = UserResponse {
            user_id: Uuid::nil(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now(),
            last_login: None,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("last_login").is_none());
        assert!(value.get("created_at").is_some());
        Ok(())
    }

    #[test]
    fn error_body_carries_reset_time() -> Result<()> {
        let body = ErrorBody {
            message: "Too many attempts".to_string(),
            reset_time: Some(Utc::now()),
        };
        let value = serde_json::to_value(&body)?;
        assert!(value.get("reset_time").is_some());
        Ok(())
    }
}
