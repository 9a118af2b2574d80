use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{EvalError, MalformedTaskId};
use crate::expression::ExpressionId;

// ── Operator ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    /// Precedence before any bracket-depth bonus.
    pub fn base_priority(self) -> i32 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }

    pub fn apply(self, a: f64, b: f64) -> Result<f64, EvalError> {
        crate::resolver::apply(self, a, b)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ── TaskId ────────────────────────────────────────────────────

/// `<expression id>-<sequence>`, sequence starting at 1 per expression.
///
/// The owning expression is carried as a field; it is never recovered by
/// prefix matching against other ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskId {
    pub expression: ExpressionId,
    pub seq: u32,
}

impl TaskId {
    pub fn new(expression: ExpressionId, seq: u32) -> Self {
        Self { expression, seq }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.expression, self.seq)
    }
}

impl FromStr for TaskId {
    type Err = MalformedTaskId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (expression, seq) = s
            .rsplit_once('-')
            .ok_or_else(|| MalformedTaskId(s.to_string()))?;
        if expression.is_empty() {
            return Err(MalformedTaskId(s.to_string()));
        }
        let seq = seq.parse().map_err(|_| MalformedTaskId(s.to_string()))?;
        Ok(Self::new(ExpressionId::new(expression), seq))
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TaskId {
    type Error = MalformedTaskId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ── Operand ───────────────────────────────────────────────────

/// A task argument: either known, or waiting on another task's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(f64),
    Pending(TaskId),
}

impl Operand {
    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Literal(v) => Some(*v),
            Operand::Pending(_) => None,
        }
    }

    pub fn waits_on(&self, producer: &TaskId) -> bool {
        matches!(self, Operand::Pending(id) if id == producer)
    }
}

// ── Task ──────────────────────────────────────────────────────

/// One atomic binary operation extracted from an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub arg1: Operand,
    pub arg2: Operand,
    pub operation: Operator,
    /// Higher dispatches first.
    pub priority: i32,
    pub operation_time: Duration,
}

impl Task {
    /// The owning expression, carried by the task id.
    pub fn expression_id(&self) -> &ExpressionId {
        &self.id.expression
    }

    pub fn is_ready(&self) -> bool {
        self.arg1.value().is_some() && self.arg2.value().is_some()
    }

    /// Replace every placeholder produced by `producer` with `value`.
    /// Returns `true` if anything was filled.
    pub fn fill(&mut self, producer: &TaskId, value: f64) -> bool {
        let mut filled = false;
        for arg in [&mut self.arg1, &mut self.arg2] {
            if arg.waits_on(producer) {
                *arg = Operand::Literal(value);
                filled = true;
            }
        }
        filled
    }

    /// Snapshot with concrete operands, or `None` while a placeholder remains.
    pub fn to_ready(&self) -> Option<ReadyTask> {
        Some(ReadyTask {
            id: self.id.clone(),
            arg1: self.arg1.value()?,
            arg2: self.arg2.value()?,
            operation: self.operation,
            operation_time: self.operation_time,
            expression_id: self.id.expression.clone(),
            priority: self.priority,
        })
    }
}

/// A dispatchable task as handed to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReadyTask {
    #[schema(value_type = String, example = "1718000000000000000-1")]
    pub id: TaskId,
    pub arg1: f64,
    pub arg2: f64,
    #[schema(value_type = String, example = "+")]
    pub operation: Operator,
    /// Simulated execution delay in milliseconds.
    #[serde(with = "duration_ms")]
    #[schema(value_type = u64)]
    pub operation_time: Duration,
    pub expression_id: ExpressionId,
    pub priority: i32,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(arg1: Operand, arg2: Operand) -> Task {
        Task {
            id: TaskId::new(ExpressionId::new("7"), 2),
            arg1,
            arg2,
            operation: Operator::Mul,
            priority: 2,
            operation_time: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_task_id_parses_on_last_dash() {
        let id: TaskId = "10-3".parse().unwrap();
        assert_eq!(id.expression, ExpressionId::new("10"));
        assert_eq!(id.seq, 3);
        assert_eq!(id.to_string(), "10-3");

        assert!("10".parse::<TaskId>().is_err());
        assert!("-3".parse::<TaskId>().is_err());
        assert!("10-x".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_fill_only_matching_placeholder() {
        let producer = TaskId::new(ExpressionId::new("7"), 1);
        let other = TaskId::new(ExpressionId::new("70"), 1);
        let mut t = task(Operand::Pending(producer.clone()), Operand::Literal(0.0));

        assert!(!t.fill(&other, 5.0));
        assert!(!t.is_ready());
        assert!(t.to_ready().is_none());

        assert!(t.fill(&producer, 5.0));
        assert!(t.is_ready());
        let ready = t.to_ready().unwrap();
        assert_eq!((ready.arg1, ready.arg2), (5.0, 0.0));
    }

    #[test]
    fn test_owning_expression_comes_from_id() {
        let t = task(Operand::Literal(1.0), Operand::Literal(2.0));
        assert_eq!(t.expression_id(), &ExpressionId::new("7"));
        assert_eq!(t.to_ready().unwrap().expression_id, t.id.expression);
    }

    #[test]
    fn test_ready_task_wire_format() {
        let ready = task(Operand::Literal(1.5), Operand::Literal(2.0)).to_ready().unwrap();
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "7-2",
                "arg1": 1.5,
                "arg2": 2.0,
                "operation": "*",
                "operation_time": 200,
                "expression_id": "7",
                "priority": 2,
            })
        );
        let back: ReadyTask = serde_json::from_value(json).unwrap();
        assert_eq!(back, ready);
    }
}
