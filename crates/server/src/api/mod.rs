//! HTTP handlers.
//!
//! Public endpoints live in `expressions`, the agent-facing ones in `tasks`.
//! Shared error plumbing lives here.

pub mod doc;
mod expressions;
mod health;
mod tasks;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;

use calc_core::wire::ErrorResponse;
use calc_core::StoreError;

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// Any body that fails to parse or validate is a 422.
pub(crate) fn body_err(rejection: JsonRejection) -> ApiError {
    api_error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
}

pub(crate) fn store_err(err: StoreError) -> ApiError {
    let status = match err {
        StoreError::ExpressionNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::MalformedTaskId(_) | StoreError::Compile(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    api_error(status, err.to_string())
}

// ── Re-exports ───────────────────────────────────────────────────

pub use expressions::{calculate, expression_get, expressions_list};
pub use health::health;
pub use tasks::{task_next, task_report};
