//! Login endpoint: credential verification plus session minting.

use anyhow::anyhow;
use axum::{
    extract::{ConnectInfo, Extension},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    error::AuthError,
    password::verify_password,
    rate_limit::{check_rate_limit, record_attempt, RateLimitAction, RateLimitDecision},
    session::session_cookie,
    state::AuthState,
    storage::{insert_session, lookup_credentials, touch_last_login},
    types::{AuthResponse, ErrorBody, LoginRequest, UserResponse},
    utils::{client_ip, normalize_email},
};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Extension(pool): Extension<PgPool>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let ip = client_ip(&headers, peer);
    let decision = check_rate_limit(
        &pool,
        &ip,
        RateLimitAction::Login,
        auth_state.config().login_limit(),
    )
    .await?;
    if let RateLimitDecision::Limited { reset_time } = decision {
        warn!("Login rate limited for {ip}");
        return Err(AuthError::RateLimited { reset_time });
    }

    let email = normalize_email(&request.email);
    let record = lookup_credentials(&pool, &email).await?;

    // Unknown emails verify against a dummy hash so the timing envelope and
    // the error are identical to a wrong password.
    let stored_hash = record
        .as_ref()
        .map_or_else(|| auth_state.dummy_hash(), |r| r.password_hash.as_str());
    let verified = verify_password(&request.password, stored_hash)? && record.is_some();

    // Only successful attempts carry the user id; a failed attempt must not
    // link the guess to an account.
    record_attempt(
        &pool,
        &ip,
        RateLimitAction::Login,
        record.as_ref().filter(|_| verified).map(|r| r.user_id),
        verified,
    )
    .await?;

    let Some(record) = record.filter(|_| verified) else {
        return Err(AuthError::InvalidCredentials);
    };

    let last_login = touch_last_login(&pool, record.user_id).await?;
    let token = insert_session(
        &pool,
        record.user_id,
        auth_state.config().session_ttl_seconds(),
    )
    .await?;

    let cookie = session_cookie(auth_state.config(), &token)
        .map_err(|err| anyhow!("failed to build session cookie: {err}"))?;
    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);

    info!("Login successful for user {}", record.user_id);

    Ok((
        StatusCode::OK,
        response_headers,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: Some(UserResponse {
                user_id: record.user_id,
                email: record.email,
                created_at: record.created_at,
                last_login: Some(last_login),
            }),
        }),
    ))
}
