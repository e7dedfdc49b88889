use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::models::{Event, NewEvent};

/// POST /trips/:trip_id/events
pub async fn create(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(trip_id): Path<String>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> ApiResult<Event> {
    let Json(request) = payload?;
    let event = state.events.create_event(&user, &trip_id, request).await?;
    Ok(ApiResponse::created(event))
}

/// GET /trips/:trip_id/events - ascending by date
pub async fn list(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> ApiResult<Vec<Event>> {
    Ok(ApiResponse::success(state.events.list_events(&user, &trip_id).await?))
}

/// GET /trips/:trip_id/events/:event_id
pub async fn get(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((trip_id, event_id)): Path<(String, String)>,
) -> ApiResult<Event> {
    Ok(ApiResponse::success(
        state.events.get_event(&user, &trip_id, &event_id).await?,
    ))
}
