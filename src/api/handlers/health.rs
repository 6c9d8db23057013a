use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

// axum handler for the service root
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the ConceptCraft API",
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health() -> impl IntoResponse {
    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }));

    let mut headers = HeaderMap::new();
    if let Ok(value) = format!(
        "{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
    .parse()
    {
        headers.insert("X-App", value);
    }

    (headers, body)
}

#[utoipa::path(
    get,
    path = "/health/detailed",
    responses(
        (status = 200, description = "Service health including database connectivity")
    ),
    tag = "health"
)]
// axum handler for health with a database connectivity probe
pub async fn health_detailed(Extension(pool): Extension<PgPool>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "connected",
        Err(err) => {
            error!("Health database check failed: {err}");
            "error"
        }
    };

    Json(json!({
        "status": if database == "connected" { "OK" } else { "DEGRADED" },
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "timestamp": chrono::Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn health_sets_app_header() -> Result<()> {
        let response = health().await.into_response();
        let app = response
            .headers()
            .get("X-App")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(app.starts_with("conceptcraft:"));
        Ok(())
    }

    #[tokio::test]
    async fn root_returns_welcome() -> Result<()> {
        let response = root().await.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("Welcome to the ConceptCraft API")
        );
        Ok(())
    }
}
