//! Ready queue: tasks whose operands are all concrete.
//!
//! Ordered by priority (highest first), then by creation order (oldest
//! first), so equal-priority tasks dispatch deterministically.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use calc_core::Task;

pub(crate) struct ReadyEntry {
    pub task: Task,
    /// Creation sequence assigned by the store at submission.
    pub order: u64,
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .priority
            .cmp(&other.task.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Default)]
pub(crate) struct ReadyQueue {
    heap: BinaryHeap<ReadyEntry>,
}

impl ReadyQueue {
    pub fn push(&mut self, task: Task, order: u64) {
        debug_assert!(task.is_ready(), "task {} queued with a placeholder", task.id);
        self.heap.push(ReadyEntry { task, order });
    }

    pub fn pop(&mut self) -> Option<ReadyEntry> {
        self.heap.pop()
    }

    /// Entries currently queued, including ones whose expression has since
    /// finished; those are dropped when popped.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use calc_core::{ExpressionId, Operand, Operator, TaskId};

    fn task(seq: u32, priority: i32) -> Task {
        let expr = ExpressionId::new("q");
        Task {
            id: TaskId::new(expr, seq),
            arg1: Operand::Literal(1.0),
            arg2: Operand::Literal(1.0),
            operation: Operator::Add,
            priority,
            operation_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_priority_then_creation_order() {
        let mut queue = ReadyQueue::default();
        queue.push(task(1, 1), 10);
        queue.push(task(2, 3), 11);
        queue.push(task(3, 3), 12);
        queue.push(task(4, 2), 9);

        let popped: Vec<u32> = std::iter::from_fn(|| queue.pop()).map(|e| e.task.id.seq).collect();
        assert_eq!(popped, vec![2, 3, 4, 1]);
    }
}
