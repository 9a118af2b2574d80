use thiserror::Error;

use crate::expression::ExpressionId;

/// Reasons an expression cannot be decomposed into tasks.
///
/// All of these are caused by the submitted text and are terminal for the
/// submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("unacceptable symbol: {0}")]
    UnacceptableSymbol(String),

    #[error("extra open bracket")]
    ExtraOpenBracket,

    #[error("extra close bracket")]
    ExtraCloseBracket,

    #[error("invalid expression")]
    InvalidExpression,
}

/// Domain errors raised while applying a single operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("operator not supported: {0}")]
    OperatorNotSupported(String),

    /// Overflowed to infinity or produced NaN.
    #[error("result out of range")]
    OutOfRange,
}

/// A task id that is not of the form `<expression>-<n>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed task id: {0}")]
pub struct MalformedTaskId(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    #[error(transparent)]
    MalformedTaskId(#[from] MalformedTaskId),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Either failure that can end a local evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
