//! Infix to postfix conversion (shunting-yard).
//!
//! Every `(` raises the bracket depth by 2 and every `)` lowers it by 2.
//! An operator's effective priority is its base precedence plus the depth
//! at which it appears; that value is used both for stack ordering here and
//! later as the task's dispatch priority.

use calc_core::{CompileError, Operator};

use crate::lexer::Token;

const DEPTH_STEP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostfixItem {
    Number(f64),
    Operator { op: Operator, priority: i32 },
}

enum Pending {
    Open,
    Operator { op: Operator, priority: i32 },
}

pub fn to_postfix(tokens: &[Token]) -> Result<Vec<PostfixItem>, CompileError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Pending> = Vec::new();
    let mut depth = 0;

    for token in tokens {
        match *token {
            Token::Number(n) => output.push(PostfixItem::Number(n)),
            Token::Open => {
                depth += DEPTH_STEP;
                stack.push(Pending::Open);
            }
            Token::Close => {
                loop {
                    match stack.pop() {
                        Some(Pending::Open) => break,
                        Some(Pending::Operator { op, priority }) => {
                            output.push(PostfixItem::Operator { op, priority })
                        }
                        None => return Err(CompileError::InvalidExpression),
                    }
                }
                depth -= DEPTH_STEP;
            }
            Token::Operator(op) => {
                let priority = op.base_priority() + depth;
                while let Some(&Pending::Operator { op: top, priority: top_priority }) =
                    stack.last()
                {
                    if top_priority < priority {
                        break;
                    }
                    stack.pop();
                    output.push(PostfixItem::Operator { op: top, priority: top_priority });
                }
                stack.push(Pending::Operator { op, priority });
            }
        }
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator { op, priority } => {
                output.push(PostfixItem::Operator { op, priority })
            }
            Pending::Open => return Err(CompileError::InvalidExpression),
        }
    }

    Ok(output)
}
