//! OpenAPI document for the auth API, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::api::handlers::auth::types::{
    AuthResponse, ErrorBody, LoginRequest, SignupRequest, UserResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ConceptCraft Auth API",
        description = "Signup, login, session, and current-user endpoints"
    ),
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::health::health_detailed,
        crate::api::handlers::auth::signup::signup,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::session::logout,
        crate::api::handlers::auth::session::me,
    ),
    components(schemas(SignupRequest, LoginRequest, AuthResponse, UserResponse, ErrorBody)),
    tags(
        (name = "auth", description = "Authentication and session management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
