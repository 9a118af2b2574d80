use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of a submitted expression.
///
/// Derived from the submission wall-clock in nanoseconds; the store keeps
/// them strictly increasing so two submissions never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ExpressionId(String);

impl ExpressionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    Pending,
    Done,
    Failed,
}

impl fmt::Display for ExpressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionStatus::Pending => write!(f, "pending"),
            ExpressionStatus::Done => write!(f, "done"),
            ExpressionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A submitted formula and its aggregate evaluation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Expression {
    pub id: ExpressionId,
    /// Text as submitted.
    #[serde(rename = "expression")]
    pub source: String,
    pub status: ExpressionStatus,
    /// Only set once `status` is `done`.
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Expression {
    pub fn new(id: ExpressionId, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            status: ExpressionStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ExpressionStatus::Pending
    }

    /// Transition `pending -> done`. Returns `false` if already terminal.
    pub fn complete(&mut self, value: f64) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ExpressionStatus::Done;
        self.result = Some(value);
        true
    }

    /// Transition `pending -> failed`. Returns `false` if already terminal.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = ExpressionStatus::Failed;
        self.error = Some(reason.into());
        true
    }
}
