//! In-memory store of expressions and their pending tasks.
//!
//! All state sits behind one mutex; every public operation takes it once
//! and releases it before returning. Nothing hands out references into
//! the maps.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use calc_core::config::{OperationTimes, SchedulerConfig};
use calc_core::{Expression, ExpressionId, ExpressionStatus, Operand, ReadyTask, StoreError, Task, TaskId};

use crate::ready::ReadyQueue;

/// A task still waiting on at least one placeholder.
struct Waiting {
    task: Task,
    order: u64,
}

/// A dispatched task whose result has not arrived yet.
struct Lease {
    task: Task,
    order: u64,
    deadline: Instant,
}

struct ExpressionEntry {
    expression: Expression,
    waiting: HashMap<TaskId, Waiting>,
    /// Tasks not yet reported: waiting, queued, or dispatched.
    outstanding: HashSet<TaskId>,
}

#[derive(Default)]
struct StoreState {
    expressions: BTreeMap<ExpressionId, ExpressionEntry>,
    ready: ReadyQueue,
    in_flight: HashMap<TaskId, Lease>,
    next_order: u64,
    last_id_nanos: i64,
}

/// Point-in-time counters for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct StoreStats {
    pub expressions: usize,
    pub pending: usize,
    pub done: usize,
    pub failed: usize,
    /// Queue entries, including stale ones not yet discarded.
    pub ready: usize,
    pub waiting: usize,
    pub in_flight: usize,
}

pub struct TaskStore {
    state: Mutex<StoreState>,
    times: OperationTimes,
    lease: Option<Duration>,
}

impl TaskStore {
    pub fn new(times: OperationTimes, config: SchedulerConfig) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            times,
            lease: config.lease,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new expression and compile it into tasks.
    ///
    /// On a compile error the expression is still recorded, as `failed`,
    /// and the error is returned.
    pub fn submit(&self, source: &str) -> Result<ExpressionId, StoreError> {
        let mut state = self.state();
        let id = state.next_expression_id();
        self.register(&mut state, id.clone(), source)?;
        Ok(id)
    }

    fn register(
        &self,
        state: &mut StoreState,
        id: ExpressionId,
        source: &str,
    ) -> Result<(), StoreError> {
        let mut entry = ExpressionEntry {
            expression: Expression::new(id.clone(), source),
            waiting: HashMap::new(),
            outstanding: HashSet::new(),
        };

        let plan = match calc_compiler::compile(source, &id, &self.times) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(expression_id = %id, error = %e, "expression rejected");
                entry.expression.fail(e.to_string());
                state.expressions.insert(id, entry);
                return Err(e.into());
            }
        };

        if let Operand::Literal(value) = plan.value {
            entry.expression.complete(value);
            info!(expression_id = %id, result = value, "expression has no operators, done");
        }

        let task_count = plan.tasks.len();
        for task in plan.tasks {
            let order = state.next_order;
            state.next_order += 1;
            entry.outstanding.insert(task.id.clone());
            debug!(task_id = %task.id, priority = task.priority, op = %task.operation, "task added");
            if task.is_ready() {
                state.ready.push(task, order);
            } else {
                entry.waiting.insert(task.id.clone(), Waiting { task, order });
            }
        }

        info!(expression_id = %id, tasks = task_count, "expression submitted");
        state.expressions.insert(id, entry);
        Ok(())
    }

    /// Take the highest-priority task whose operands are all known.
    ///
    /// `None` means nothing is dispatchable right now; callers should wait
    /// and poll again.
    pub fn next_task(&self) -> Option<ReadyTask> {
        self.next_task_at(Instant::now())
    }

    fn next_task_at(&self, now: Instant) -> Option<ReadyTask> {
        let mut state = self.state();
        if self.lease.is_some() {
            state.requeue_expired(now);
        }

        while let Some(entry) = state.ready.pop() {
            let live = state
                .expressions
                .get(entry.task.expression_id())
                .is_some_and(|e| !e.expression.is_terminal() && e.outstanding.contains(&entry.task.id));
            if !live {
                debug!(task_id = %entry.task.id, "dropping stale queue entry");
                continue;
            }
            let Some(ready) = entry.task.to_ready() else {
                continue;
            };

            if let Some(lease) = self.lease {
                state.in_flight.insert(
                    entry.task.id.clone(),
                    Lease { task: entry.task, order: entry.order, deadline: now + lease },
                );
            }
            info!(task_id = %ready.id, priority = ready.priority, "task dispatched");
            return Some(ready);
        }
        None
    }

    /// Record `value` as the result of `task_id`.
    ///
    /// Fills every placeholder in the owning expression that waits on this
    /// task. When nothing else is outstanding, the expression is done with
    /// `value` as its result. Reports for finished expressions or for tasks
    /// that were already reported are ignored.
    pub fn apply_result(&self, task_id: &TaskId, value: f64) -> Result<(), StoreError> {
        let mut state = self.state();
        state.in_flight.remove(task_id);

        let StoreState { expressions, ready, .. } = &mut *state;
        let entry = expressions
            .get_mut(&task_id.expression)
            .ok_or_else(|| StoreError::ExpressionNotFound(task_id.expression.clone()))?;

        if entry.expression.is_terminal() {
            debug!(task_id = %task_id, status = %entry.expression.status, "result for finished expression ignored");
            return Ok(());
        }
        if !entry.outstanding.remove(task_id) {
            warn!(task_id = %task_id, "result for unknown or already reported task ignored");
            return Ok(());
        }

        let mut unblocked = Vec::new();
        for (id, waiting) in entry.waiting.iter_mut() {
            if waiting.task.fill(task_id, value) && waiting.task.is_ready() {
                unblocked.push(id.clone());
            }
        }
        for id in unblocked {
            if let Some(waiting) = entry.waiting.remove(&id) {
                debug!(task_id = %id, "task unblocked");
                ready.push(waiting.task, waiting.order);
            }
        }

        if entry.outstanding.is_empty() {
            entry.expression.complete(value);
            info!(expression_id = %task_id.expression, result = value, "expression done");
        }
        Ok(())
    }

    /// Mark the expression owning `task_id` as failed and discard its
    /// remaining tasks.
    pub fn apply_failure(&self, task_id: &TaskId, reason: &str) -> Result<(), StoreError> {
        let mut state = self.state();

        let entry = state
            .expressions
            .get_mut(&task_id.expression)
            .ok_or_else(|| StoreError::ExpressionNotFound(task_id.expression.clone()))?;
        if !entry.expression.fail(reason) {
            debug!(task_id = %task_id, "failure for finished expression ignored");
            return Ok(());
        }
        entry.waiting.clear();
        entry.outstanding.clear();
        warn!(expression_id = %task_id.expression, task_id = %task_id, reason, "expression failed");

        state.in_flight.retain(|id, _| id.expression != task_id.expression);
        Ok(())
    }

    pub fn get(&self, id: &ExpressionId) -> Result<Expression, StoreError> {
        self.state()
            .expressions
            .get(id)
            .map(|e| e.expression.clone())
            .ok_or_else(|| StoreError::ExpressionNotFound(id.clone()))
    }

    /// Snapshot of every expression, oldest first.
    pub fn list(&self) -> Vec<Expression> {
        self.state()
            .expressions
            .values()
            .map(|e| e.expression.clone())
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state();
        let mut stats = StoreStats {
            expressions: state.expressions.len(),
            ready: state.ready.len(),
            in_flight: state.in_flight.len(),
            ..StoreStats::default()
        };
        for entry in state.expressions.values() {
            match entry.expression.status {
                ExpressionStatus::Pending => stats.pending += 1,
                ExpressionStatus::Done => stats.done += 1,
                ExpressionStatus::Failed => stats.failed += 1,
            }
            stats.waiting += entry.waiting.len();
        }
        stats
    }
}

impl StoreState {
    /// Wall-clock nanoseconds, bumped when needed to stay strictly increasing.
    fn next_expression_id(&mut self) -> ExpressionId {
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let nanos = now.max(self.last_id_nanos.saturating_add(1));
        self.last_id_nanos = nanos;
        ExpressionId::from_nanos(nanos)
    }

    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<TaskId> = self
            .in_flight
            .iter()
            .filter(|(_, lease)| lease.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(lease) = self.in_flight.remove(&id) {
                warn!(task_id = %id, "lease expired, task requeued");
                self.ready.push(lease.task, lease.order);
            }
        }
    }
}
