use axum::{extract::State, http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::json;
use time::OffsetDateTime;
use tower_http::timeout::TimeoutLayer;

use crate::{
    app_state::AppState,
    middleware::{
        language::language_middleware, timeout::timeout_envelope_middleware,
        tracing::observability_middleware,
    },
    modules::{appointments::appointment_routes, schedule::schedule_routes},
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.env.server.request_timeout;

    Router::new()
        .route("/health", get(health_check))
        .merge(schedule_routes())
        .merge(appointment_routes())
        .merge(websocket_routes())
        .route_layer(middleware::from_fn(observability_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn_with_state(
            state.localizer.clone(),
            timeout_envelope_middleware,
        ))
        .layer(middleware::from_fn(language_middleware))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match &state.db {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::warn!("Database health check failed: {}", e);
                "unhealthy"
            }
        },
        None => "not_configured",
    };

    let timestamp = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage,
        "services": {
            "database": database,
        }
    }))
}
