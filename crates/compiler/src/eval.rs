//! Local, synchronous evaluation of a plan.
//!
//! Runs the same tasks the scheduler would hand to workers, in emission
//! order, without any delay. Used by the `eval` command and as a reference
//! in tests.

use std::collections::HashMap;

use calc_core::config::OperationTimes;
use calc_core::{CalcError, EvalError, ExpressionId, Operand, TaskId};

use crate::plan::Plan;

/// Compile and evaluate `source` in-process.
pub fn evaluate(source: &str) -> Result<f64, CalcError> {
    let plan = crate::compile(source, &ExpressionId::new("local"), &OperationTimes::default())?;
    Ok(evaluate_plan(&plan)?)
}

pub fn evaluate_plan(plan: &Plan) -> Result<f64, EvalError> {
    let mut results: HashMap<&TaskId, f64> = HashMap::with_capacity(plan.tasks.len());

    for task in &plan.tasks {
        let a = operand_value(&task.arg1, &results);
        let b = operand_value(&task.arg2, &results);
        results.insert(&task.id, task.operation.apply(a, b)?);
    }

    Ok(operand_value(&plan.value, &results))
}

// Plans list producers before consumers, so a miss only happens for a
// hand-built plan that breaks that order.
fn operand_value(operand: &Operand, results: &HashMap<&TaskId, f64>) -> f64 {
    match operand {
        Operand::Literal(v) => *v,
        Operand::Pending(id) => results.get(id).copied().unwrap_or(f64::NAN),
    }
}
