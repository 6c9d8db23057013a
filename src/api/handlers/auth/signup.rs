//! Signup endpoint.

use axum::{
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    error::AuthError,
    password::{hash_password, validate_password},
    rate_limit::{check_rate_limit, record_attempt, RateLimitAction, RateLimitDecision},
    state::AuthState,
    storage::{insert_user, SignupOutcome},
    types::{AuthResponse, ErrorBody, SignupRequest},
    utils::{client_ip, normalize_email, valid_email},
};

#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate email", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Extension(pool): Extension<PgPool>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    // Admission check comes first so throttled clients stay cheap to reject.
    let ip = client_ip(&headers, peer);
    let decision = check_rate_limit(
        &pool,
        &ip,
        RateLimitAction::Signup,
        auth_state.config().signup_limit(),
    )
    .await?;
    if let RateLimitDecision::Limited { reset_time } = decision {
        warn!("Signup rate limited for {ip}");
        return Err(AuthError::RateLimited { reset_time });
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }
    if let Err(reason) = validate_password(&request.password, auth_state.config().password_policy())
    {
        return Err(AuthError::Validation(reason));
    }

    let password_hash = hash_password(&request.password)?;
    let outcome = insert_user(&pool, &email, &password_hash).await?;

    let (user_id, created) = match &outcome {
        SignupOutcome::Created(user) => (Some(user.user_id), true),
        SignupOutcome::Conflict => (None, false),
    };
    record_attempt(&pool, &ip, RateLimitAction::Signup, user_id, created).await?;

    match outcome {
        SignupOutcome::Created(user) => {
            info!("Created user {} for {}", user.user_id, user.email);
            Ok((
                StatusCode::OK,
                Json(AuthResponse {
                    message: "Account created successfully".to_string(),
                    user: None,
                }),
            ))
        }
        SignupOutcome::Conflict => Err(AuthError::DuplicateEmail),
    }
}
