use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::models::UserProfile;

/// GET / - service information (public)
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Trip Planner API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "trips": "/trips, /trips/user, /trips/:tripId[/members|/invite]",
                "events": "/trips/:tripId/events[/:eventId]",
                "tasks": "/trips/:tripId/events/:eventId/tasks[/grouped|/:taskId/status]",
                "me": "/me",
            }
        }
    }))
}

/// GET /health - document store connectivity (public)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "document store unavailable",
                    "details": e.to_string(),
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// GET /me - identity the guard attached to this request
pub async fn me(Extension(Identity(user)): Extension<Identity>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(user))
}
