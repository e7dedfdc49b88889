use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::models::{NewTask, StatusUpdate, Task};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub task: Task,
}

/// POST /trips/:trip_id/events/:event_id/tasks
pub async fn create(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((trip_id, event_id)): Path<(String, String)>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(request) = payload?;
    let task = state.tasks.create_task(&user, &trip_id, &event_id, request).await?;
    Ok(ApiResponse::created(task))
}

/// GET /trips/:trip_id/events/:event_id/tasks/grouped - tasks keyed by assignee
pub async fn grouped(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((trip_id, event_id)): Path<(String, String)>,
) -> ApiResult<BTreeMap<String, Vec<Task>>> {
    Ok(ApiResponse::success(
        state
            .tasks
            .list_tasks_grouped_by_assignee(&user, &trip_id, &event_id)
            .await?,
    ))
}

/// PATCH /trips/:trip_id/events/:event_id/tasks/:task_id/status
pub async fn set_status(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((trip_id, event_id, task_id)): Path<(String, String, String)>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<StatusResponse> {
    let Json(update) = payload?;
    let task = state
        .tasks
        .set_task_status(&user, &trip_id, &event_id, &task_id, update)
        .await?;
    Ok(ApiResponse::success(StatusResponse {
        message: format!("Task status updated to {}", task.status),
        task,
    }))
}
