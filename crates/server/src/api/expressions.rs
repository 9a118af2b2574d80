//! Client-facing expression endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use calc_core::wire::{
    ErrorResponse, ExpressionResponse, ExpressionsResponse, SubmitRequest, SubmitResponse,
};
use calc_core::ExpressionId;

use super::{body_err, store_err, ApiError};
use crate::state::AppState;

/// Submit an expression for evaluation.
#[utoipa::path(
    post,
    path = "/api/v1/calculate",
    tag = "Expressions",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Expression accepted", body = SubmitResponse),
        (status = 422, description = "Body or expression rejected", body = ErrorResponse)
    )
)]
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(req) = payload.map_err(body_err)?;
    let id = state.store.submit(&req.expression).map_err(store_err)?;
    info!(expression_id = %id, expression = %req.expression, "expression submitted");
    Ok((StatusCode::CREATED, Json(SubmitResponse { id })))
}

/// List all expressions, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/expressions",
    tag = "Expressions",
    responses(
        (status = 200, description = "Every known expression", body = ExpressionsResponse)
    )
)]
pub async fn expressions_list(State(state): State<Arc<AppState>>) -> Json<ExpressionsResponse> {
    Json(ExpressionsResponse { expressions: state.store.list() })
}

#[utoipa::path(
    get,
    path = "/api/v1/expressions/{id}",
    tag = "Expressions",
    params(("id" = String, Path, description = "Expression id")),
    responses(
        (status = 200, description = "Expression found", body = ExpressionResponse),
        (status = 404, description = "Unknown expression", body = ErrorResponse)
    )
)]
pub async fn expression_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ExpressionResponse>, ApiError> {
    let expression = state.store.get(&ExpressionId::new(id)).map_err(store_err)?;
    Ok(Json(ExpressionResponse { expression }))
}
