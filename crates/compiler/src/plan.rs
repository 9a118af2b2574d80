//! Task-graph construction from a postfix sequence.

use calc_core::config::OperationTimes;
use calc_core::{CompileError, ExpressionId, Operand, Task, TaskId};

use crate::postfix::PostfixItem;

/// Tasks for one expression, in emission order, plus where the final value
/// comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Every task's dependencies appear earlier in this list.
    pub tasks: Vec<Task>,
    /// A literal for operator-free expressions, otherwise the root task.
    pub value: Operand,
}

impl Plan {
    pub fn root(&self) -> Option<&TaskId> {
        match &self.value {
            Operand::Pending(id) => Some(id),
            Operand::Literal(_) => None,
        }
    }
}

/// Walk `postfix` with a value stack, emitting one task per operator.
pub fn build(
    postfix: &[PostfixItem],
    expression_id: &ExpressionId,
    times: &OperationTimes,
) -> Result<Plan, CompileError> {
    let mut stack: Vec<Operand> = Vec::new();
    let mut tasks = Vec::new();
    let mut seq = 0;

    for item in postfix {
        match *item {
            PostfixItem::Number(n) => stack.push(Operand::Literal(n)),
            PostfixItem::Operator { op, priority } => {
                let arg2 = stack.pop().ok_or(CompileError::InvalidExpression)?;
                let arg1 = stack.pop().ok_or(CompileError::InvalidExpression)?;
                seq += 1;
                let id = TaskId::new(expression_id.clone(), seq);
                tasks.push(Task {
                    id: id.clone(),
                    arg1,
                    arg2,
                    operation: op,
                    priority,
                    operation_time: times.for_operator(op),
                });
                stack.push(Operand::Pending(id));
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(Plan { tasks, value }),
        _ => Err(CompileError::InvalidExpression),
    }
}
