//! Arithmetic resolver: one binary operation, no state.

use crate::error::EvalError;
use crate::task::Operator;

/// Apply the operator named by `symbol` to `a` and `b`.
pub fn resolve(a: f64, b: f64, symbol: &str) -> Result<f64, EvalError> {
    let mut chars = symbol.chars();
    let op = match (chars.next(), chars.next()) {
        (Some(c), None) => Operator::from_symbol(c),
        _ => None,
    };
    match op {
        Some(op) => apply(op, a, b),
        None => Err(EvalError::OperatorNotSupported(symbol.to_string())),
    }
}

pub fn apply(op: Operator, a: f64, b: f64) -> Result<f64, EvalError> {
    let value = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
        Operator::Div => a / b,
    };
    if !value.is_finite() {
        return Err(EvalError::OutOfRange);
    }
    Ok(value)
}
