//! A single poll → execute → report loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use calc_core::wire::TaskReport;
use calc_core::TaskId;

use crate::source::TaskSource;

/// Counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub idle_polls: AtomicU64,
    pub transport_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub completed: u64,
    pub failed: u64,
    pub idle_polls: u64,
    pub transport_errors: u64,
}

impl WorkerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

/// What one cycle ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No task was available.
    Idle,
    /// Result computed and delivered.
    Completed(TaskId, f64),
    /// Evaluation failed; the failure was delivered.
    Failed(TaskId),
    /// The orchestrator could not be reached or refused the call. A task
    /// fetched in this cycle is lost.
    TransportError,
}

pub struct Worker {
    id: usize,
    source: Arc<dyn TaskSource>,
    /// Shared across the pool when only one task may be in flight.
    gate: Option<Arc<Mutex<()>>>,
    poll_interval: Duration,
    stats: Arc<WorkerStats>,
}

impl Worker {
    pub fn new(
        id: usize,
        source: Arc<dyn TaskSource>,
        gate: Option<Arc<Mutex<()>>>,
        poll_interval: Duration,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self { id, source, gate, poll_interval, stats }
    }

    /// Fetch one task, wait its simulated duration, resolve it and report.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let _gate = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let task = match self.source.fetch().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                self.stats.idle_polls.fetch_add(1, Ordering::Relaxed);
                return CycleOutcome::Idle;
            }
            Err(e) => {
                warn!(worker = self.id, error = %e, "failed to fetch task");
                self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
                return CycleOutcome::TransportError;
            }
        };
        debug!(worker = self.id, task_id = %task.id, op = %task.operation, "task received");

        tokio::time::sleep(task.operation_time).await;

        let report = match task.operation.apply(task.arg1, task.arg2) {
            Ok(value) => TaskReport::success(task.id.clone(), value),
            Err(e) => {
                warn!(worker = self.id, task_id = %task.id, error = %e, "task evaluation failed");
                TaskReport::failure(task.id.clone(), e.to_string())
            }
        };

        if let Err(e) = self.source.report(&report).await {
            warn!(worker = self.id, task_id = %task.id, error = %e, "failed to send result, task lost");
            self.stats.transport_errors.fetch_add(1, Ordering::Relaxed);
            return CycleOutcome::TransportError;
        }

        match report.result {
            Some(value) if report.error.is_none() => {
                info!(
                    worker = self.id,
                    task_id = %task.id,
                    "{} {} {} = {}",
                    task.arg1, task.operation, task.arg2, value
                );
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                CycleOutcome::Completed(task.id, value)
            }
            _ => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                CycleOutcome::Failed(task.id)
            }
        }
    }

    /// Repeat cycles until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A cycle in progress always runs to completion; only the wait after
    /// an idle or failed poll is cut short.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        debug!(worker = self.id, "worker started");
        while !*shutdown.borrow() {
            match self.run_cycle().await {
                CycleOutcome::Idle | CycleOutcome::TransportError => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        changed = shutdown.changed() => {
                            // Sender dropped: treat as shutdown.
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                CycleOutcome::Completed(..) | CycleOutcome::Failed(_) => {}
            }
        }
        debug!(worker = self.id, "worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use calc_core::{ExpressionId, Operator, ReadyTask};

    use crate::error::AgentError;

    /// Serves a fixed list of tasks and records every report.
    #[derive(Default)]
    struct Scripted {
        tasks: StdMutex<Vec<ReadyTask>>,
        reports: StdMutex<Vec<TaskReport>>,
        refuse_reports: bool,
    }

    #[async_trait]
    impl TaskSource for Scripted {
        async fn fetch(&self) -> Result<Option<ReadyTask>, AgentError> {
            Ok(self.tasks.lock().unwrap().pop())
        }

        async fn report(&self, report: &TaskReport) -> Result<(), AgentError> {
            if self.refuse_reports {
                return Err(AgentError::UnexpectedStatus { status: 503, body: String::new() });
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn ready(seq: u32, a: f64, op: Operator, b: f64, ms: u64) -> ReadyTask {
        let expr = ExpressionId::new("w");
        ReadyTask {
            id: TaskId::new(expr.clone(), seq),
            arg1: a,
            arg2: b,
            operation: op,
            operation_time: Duration::from_millis(ms),
            expression_id: expr,
            priority: 1,
        }
    }

    fn worker(source: Arc<Scripted>) -> (Worker, Arc<WorkerStats>) {
        let stats = Arc::new(WorkerStats::default());
        let worker = Worker::new(0, source, None, Duration::from_secs(1), stats.clone());
        (worker, stats)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_honours_operation_time() {
        let source = Arc::new(Scripted::default());
        source.tasks.lock().unwrap().push(ready(1, 6.0, Operator::Div, 4.0, 200));
        let (worker, stats) = worker(source.clone());

        let start = tokio::time::Instant::now();
        let outcome = worker.run_cycle().await;
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(outcome, CycleOutcome::Completed(TaskId::new(ExpressionId::new("w"), 1), 1.5));
        assert_eq!(source.reports.lock().unwrap()[0].result, Some(1.5));
        assert_eq!(stats.snapshot().completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_error_is_reported() {
        let source = Arc::new(Scripted::default());
        source.tasks.lock().unwrap().push(ready(2, 1.0, Operator::Div, 0.0, 10));
        let (worker, stats) = worker(source.clone());

        assert!(matches!(worker.run_cycle().await, CycleOutcome::Failed(_)));
        let reports = source.reports.lock().unwrap();
        assert_eq!(reports[0].error.as_deref(), Some("division by zero"));
        assert_eq!(reports[0].result, None);
        assert_eq!(stats.snapshot().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflowing_result_is_reported_as_failure() {
        let source = Arc::new(Scripted::default());
        source.tasks.lock().unwrap().push(ready(4, f64::MAX, Operator::Mul, 2.0, 10));
        let (worker, stats) = worker(source.clone());

        assert!(matches!(worker.run_cycle().await, CycleOutcome::Failed(_)));
        let reports = source.reports.lock().unwrap();
        assert_eq!(reports[0].error.as_deref(), Some("result out of range"));
        assert_eq!(reports[0].result, None);
        assert_eq!(stats.snapshot().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_source_is_idle() {
        let (worker, stats) = worker(Arc::new(Scripted::default()));
        assert_eq!(worker.run_cycle().await, CycleOutcome::Idle);
        assert_eq!(stats.snapshot().idle_polls, 1);
        assert_eq!(stats.snapshot().transport_errors, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_report_loses_task() {
        let source = Arc::new(Scripted { refuse_reports: true, ..Scripted::default() });
        source.tasks.lock().unwrap().push(ready(3, 1.0, Operator::Add, 1.0, 10));
        let (worker, stats) = worker(source.clone());

        assert_eq!(worker.run_cycle().await, CycleOutcome::TransportError);
        assert_eq!(stats.snapshot().transport_errors, 1);
        assert!(source.tasks.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_polls_once_per_interval() {
        let (worker, stats) = worker(Arc::new(Scripted::default()));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(stats.snapshot().idle_polls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_worker() {
        let (worker, stats) = worker(Arc::new(Scripted::default()));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker kept running after its sender was dropped")
            .unwrap();

        assert!(stats.snapshot().idle_polls <= 3);
    }
}
