//! Expression compiler: infix text to an ordered set of binary-operation tasks.
//!
//! Pipeline: whitespace strip → bracket balance → [`lexer`] → [`postfix`]
//! (shunting-yard with bracket-depth priorities) → [`plan`] (task graph).

pub mod eval;
pub mod lexer;
pub mod plan;
pub mod postfix;

use calc_core::config::OperationTimes;
use calc_core::{CompileError, ExpressionId};

pub use eval::{evaluate, evaluate_plan};
pub use lexer::Token;
pub use plan::Plan;
pub use postfix::PostfixItem;

/// Compile `source` into the task plan for expression `id`.
pub fn compile(
    source: &str,
    id: &ExpressionId,
    times: &OperationTimes,
) -> Result<Plan, CompileError> {
    let text: String = source.chars().filter(|c| !c.is_whitespace()).collect();
    check_brackets(&text)?;
    let tokens = lexer::tokenize(&text)?;
    let postfix = postfix::to_postfix(&tokens)?;
    let plan = plan::build(&postfix, id, times)?;
    tracing::debug!(expression_id = %id, tasks = plan.tasks.len(), "expression compiled");
    Ok(plan)
}

/// Compare bracket counts before anything else is looked at.
pub fn check_brackets(text: &str) -> Result<(), CompileError> {
    let open = text.matches('(').count();
    let close = text.matches(')').count();
    match open.cmp(&close) {
        std::cmp::Ordering::Greater => Err(CompileError::ExtraOpenBracket),
        std::cmp::Ordering::Less => Err(CompileError::ExtraCloseBracket),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calc_core::{Operand, Operator, TaskId};

    fn id() -> ExpressionId {
        ExpressionId::new("1")
    }

    fn compile_default(source: &str) -> Result<Plan, CompileError> {
        compile(source, &id(), &OperationTimes::default())
    }

    #[test]
    fn test_bracket_errors_win_over_bad_symbols() {
        assert_eq!(compile_default("1 + (3 * ()"), Err(CompileError::ExtraOpenBracket));
        assert_eq!(compile_default("1 + 1 * (2 + 1))"), Err(CompileError::ExtraCloseBracket));
        // The body is never tokenized when counts differ.
        assert_eq!(compile_default("& (("), Err(CompileError::ExtraOpenBracket));
        assert_eq!(compile_default("x )"), Err(CompileError::ExtraCloseBracket));
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(compile_default(""), Err(CompileError::InvalidExpression));
        assert_eq!(compile_default("   "), Err(CompileError::InvalidExpression));
        assert_eq!(compile_default("2 / + 0"), Err(CompileError::InvalidExpression));
        assert_eq!(compile_default("1 + *"), Err(CompileError::InvalidExpression));
        assert_eq!(compile_default("2 ( 8)"), Err(CompileError::InvalidExpression));
        assert_eq!(compile_default(")1 + 2("), Err(CompileError::InvalidExpression));
        assert!(matches!(
            compile_default("& j"),
            Err(CompileError::UnacceptableSymbol(_))
        ));
    }

    #[test]
    fn test_nested_example_produces_three_tasks() {
        let plan = compile_default("1.2 + 1 * (2 + 1)").unwrap();
        assert_eq!(plan.tasks.len(), 3);

        let t1 = TaskId::new(id(), 1);
        let t2 = TaskId::new(id(), 2);
        let t3 = TaskId::new(id(), 3);

        let [first, second, third] = &plan.tasks[..] else {
            panic!("expected three tasks");
        };
        assert_eq!(first.id, t1);
        assert_eq!(first.operation, Operator::Add);
        assert_eq!((first.arg1.clone(), first.arg2.clone()), (Operand::Literal(2.0), Operand::Literal(1.0)));
        assert_eq!(first.priority, 3);

        assert_eq!(second.id, t2);
        assert_eq!(second.operation, Operator::Mul);
        assert_eq!(second.arg1, Operand::Literal(1.0));
        assert_eq!(second.arg2, Operand::Pending(t1));
        assert_eq!(second.priority, 2);

        assert_eq!(third.id, t3);
        assert_eq!(third.arg1, Operand::Literal(1.2));
        assert_eq!(third.arg2, Operand::Pending(t2));
        assert_eq!(third.priority, 1);

        assert_eq!(plan.value, Operand::Pending(t3));
    }

    #[test]
    fn test_operation_times_are_stamped_per_operator() {
        let times = OperationTimes {
            addition: std::time::Duration::from_millis(1),
            subtraction: std::time::Duration::from_millis(2),
            multiplication: std::time::Duration::from_millis(3),
            division: std::time::Duration::from_millis(4),
        };
        let plan = compile("1 + 2 - 3 * 4 / 5", &id(), &times).unwrap();
        for task in &plan.tasks {
            assert_eq!(task.operation_time, times.for_operator(task.operation));
            assert_eq!(task.expression_id(), &id());
        }
    }

    #[test]
    fn test_bare_literal_has_no_tasks() {
        let plan = compile_default(" (42.5) ").unwrap();
        assert!(plan.tasks.is_empty());
        assert_eq!(plan.value, Operand::Literal(42.5));
    }
}
