use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::models::{InviteRequest, NewTrip, Trip, UserSnapshot};

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub message: &'static str,
    pub member: UserSnapshot,
}

/// POST /trips - create a trip owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    payload: Result<Json<NewTrip>, JsonRejection>,
) -> ApiResult<Trip> {
    let Json(request) = payload?;
    let trip = state.trips.create_trip(&user, request).await?;
    Ok(ApiResponse::created(trip))
}

/// GET /trips/user - trips the caller owns or belongs to
pub async fn list_for_user(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> ApiResult<Vec<Trip>> {
    Ok(ApiResponse::success(state.trips.list_trips_for_user(&user).await?))
}

/// GET /trips/:trip_id
pub async fn get(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> ApiResult<Trip> {
    Ok(ApiResponse::success(state.trips.get_trip(&user, &trip_id).await?))
}

/// GET /trips/:trip_id/members - owner first, then members
pub async fn members(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(trip_id): Path<String>,
) -> ApiResult<Vec<UserSnapshot>> {
    Ok(ApiResponse::success(state.trips.get_members(&user, &trip_id).await?))
}

/// POST /trips/:trip_id/invite - owner invites a user by email
pub async fn invite(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(trip_id): Path<String>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> ApiResult<InviteResponse> {
    let Json(request) = payload?;
    let member = state.trips.invite_member(&user, &trip_id, request).await?;
    Ok(ApiResponse::success(InviteResponse {
        message: "User invited successfully",
        member,
    }))
}
