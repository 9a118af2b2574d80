//! JSON request and response bodies shared by the orchestrator and agents.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::expression::{Expression, ExpressionId};
use crate::task::{ReadyTask, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitRequest {
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub id: ExpressionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpressionsResponse {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpressionResponse {
    pub expression: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub task: ReadyTask,
}

/// Outcome of one task, posted back by a worker.
///
/// A successful report carries `result`; a failed one carries `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskReport {
    #[schema(value_type = String)]
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskReport {
    pub fn success(id: TaskId, result: f64) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn failure(id: TaskId, error: impl Into<String>) -> Self {
        Self { id, result: None, error: Some(error.into()) }
    }

    /// `None` when the report carries neither a result nor an error.
    pub fn outcome(&self) -> Option<Result<f64, &str>> {
        match (&self.error, self.result) {
            (Some(err), _) => Some(Err(err.as_str())),
            (None, Some(value)) => Some(Ok(value)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
