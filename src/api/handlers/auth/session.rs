//! Session cookie plumbing, logout, and current-user lookup.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    error::AuthError,
    state::{AuthConfig, AuthState},
    storage::{delete_session, fetch_user, lookup_session},
    types::{AuthResponse, ErrorBody, UserResponse},
    utils::hash_session_token,
};

const SESSION_COOKIE_NAME: &str = "session_id";

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session cleared", body = AuthResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    Extension(pool): Extension<PgPool>,
    Extension(auth_state): Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Logout never fails from the client's point of view.
    if let Some(token) = extract_session_token(&headers) {
        let token_hash = hash_session_token(&token);
        if let Err(err) = delete_session(&pool, &token_hash).await {
            error!("Failed to delete session: {err:#}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        response_headers,
        Json(AuthResponse {
            message: "Logged out".to_string(),
            user: None,
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Cookie absent or session invalid", body = ErrorBody),
        (status = 404, description = "Session valid but user record missing", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    Extension(pool): Extension<PgPool>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(token) = extract_session_token(&headers) else {
        return Err(AuthError::SessionInvalid);
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    let Some(session) = lookup_session(&pool, &token_hash).await? else {
        return Err(AuthError::SessionInvalid);
    };

    // The session can outlive its user record; surface that as 404, not 401.
    let Some(user) = fetch_user(&pool, session.user_id).await? else {
        return Err(AuthError::NotFound);
    };

    Ok((
        StatusCode::OK,
        Json(UserResponse {
            user_id: user.user_id,
            email: user.email,
            created_at: user.created_at,
            last_login: user.last_login,
        }),
    ))
}

/// Build the `HttpOnly` session cookie with `Max-Age` equal to the TTL.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    // Only mark cookies secure when the frontend is served over HTTPS.
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    fn http_config() -> AuthConfig {
        AuthConfig::new("http://localhost:3000".to_string())
    }

    fn https_config() -> AuthConfig {
        AuthConfig::new("https://app.example.com".to_string())
    }

    #[test]
    fn session_cookie_sets_ttl_and_flags() -> Result<()> {
        let cookie = session_cookie(&http_config(), "token123")?;
        let cookie = cookie.to_str().context("cookie should be ascii")?;
        assert!(cookie.starts_with("session_id=token123;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=900"));
        assert!(!cookie.contains("Secure"));
        Ok(())
    }

    #[test]
    fn session_cookie_secure_over_https() -> Result<()> {
        let cookie = session_cookie(&https_config(), "token123")?;
        assert!(cookie.to_str().context("ascii")?.contains("; Secure"));
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> Result<()> {
        let cookie = clear_session_cookie(&http_config())?;
        let cookie = cookie.to_str().context("ascii")?;
        assert!(cookie.starts_with("session_id=;"));
        assert!(cookie.contains("Max-Age=0"));
        Ok(())
    }

    #[test]
    fn extract_session_token_finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=ja"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_session_token_missing_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_session_token(&headers), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
