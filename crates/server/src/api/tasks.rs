//! Agent-facing task endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use calc_core::wire::{ErrorResponse, TaskReport, TaskResponse};

use super::{api_error, body_err, store_err, ApiError};
use crate::state::AppState;

/// Hand out the highest-priority ready task.
#[utoipa::path(
    get,
    path = "/internal/task",
    tag = "Tasks",
    responses(
        (status = 200, description = "Task dispatched", body = TaskResponse),
        (status = 404, description = "No tasks available", body = ErrorResponse)
    )
)]
pub async fn task_next(State(state): State<Arc<AppState>>) -> Result<Json<TaskResponse>, ApiError> {
    match state.store.next_task() {
        Some(task) => {
            debug!(task_id = %task.id, priority = task.priority, "task dispatched");
            Ok(Json(TaskResponse { task }))
        }
        None => Err(api_error(StatusCode::NOT_FOUND, "No tasks available")),
    }
}

/// Accept a task result or failure from an agent.
#[utoipa::path(
    post,
    path = "/internal/task",
    tag = "Tasks",
    request_body = TaskReport,
    responses(
        (status = 200, description = "Report applied"),
        (status = 404, description = "Owning expression unknown", body = ErrorResponse),
        (status = 422, description = "Invalid report", body = ErrorResponse)
    )
)]
pub async fn task_report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TaskReport>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(report) = payload.map_err(body_err)?;
    let applied = match report.outcome() {
        Some(Ok(value)) => state.store.apply_result(&report.id, value),
        Some(Err(reason)) => state.store.apply_failure(&report.id, reason),
        None => {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "report needs either \"result\" or \"error\"",
            ))
        }
    };
    applied.map_err(store_err)?;
    Ok(StatusCode::OK)
}
