//! Fixed-size set of workers sharing one task source.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use calc_core::config::AgentConfig;

use crate::source::TaskSource;
use crate::worker::{StatsSnapshot, Worker, WorkerStats};

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
    stats: Arc<WorkerStats>,
}

impl WorkerPool {
    /// Start `computing_power` workers (at least one) on the current runtime.
    pub fn spawn(config: &AgentConfig, source: Arc<dyn TaskSource>) -> Self {
        let size = config.computing_power.max(1);
        let gate = config.single_flight.then(|| Arc::new(Mutex::new(())));
        let stats = Arc::new(WorkerStats::default());
        let (shutdown, rx) = watch::channel(false);

        let handles = (0..size)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    source.clone(),
                    gate.clone(),
                    config.poll_interval,
                    stats.clone(),
                );
                tokio::spawn(worker.run(rx.clone()))
            })
            .collect();

        info!(workers = size, single_flight = config.single_flight, "worker pool started");
        Self { handles, shutdown, stats }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Signal every worker and wait for in-progress cycles to finish.
    pub async fn shutdown(self) -> StatsSnapshot {
        // Receivers live inside the workers, so send only fails once all have exited.
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
        let stats = self.stats.snapshot();
        info!(
            completed = stats.completed,
            failed = stats.failed,
            transport_errors = stats.transport_errors,
            "worker pool stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use calc_core::config::{OperationTimes, SchedulerConfig};
    use calc_core::wire::TaskReport;
    use calc_core::{ExpressionId, ExpressionStatus, ReadyTask};
    use calc_scheduler::TaskStore;

    use crate::error::AgentError;

    /// In-process source backed by the real scheduler store.
    struct LocalSource {
        store: TaskStore,
        fetches: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl LocalSource {
        fn new(delay_ms: u64) -> Self {
            let times = OperationTimes::uniform(Duration::from_millis(delay_ms));
            Self {
                store: TaskStore::new(times, SchedulerConfig::default()),
                fetches: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskSource for LocalSource {
        async fn fetch(&self) -> Result<Option<ReadyTask>, AgentError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let task = self.store.next_task();
            if task.is_some() {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_active.fetch_max(now, Ordering::SeqCst);
            }
            Ok(task)
        }

        async fn report(&self, report: &TaskReport) -> Result<(), AgentError> {
            self.active.fetch_sub(1, Ordering::SeqCst);
            let outcome = match report.outcome() {
                Some(Ok(value)) => self.store.apply_result(&report.id, value),
                Some(Err(reason)) => self.store.apply_failure(&report.id, reason),
                None => return Err(AgentError::Decode("empty report".into())),
            };
            outcome.map_err(|e| AgentError::UnexpectedStatus { status: 404, body: e.to_string() })
        }
    }

    fn agent_config(workers: usize, single_flight: bool) -> AgentConfig {
        AgentConfig {
            computing_power: workers,
            poll_interval: Duration::from_millis(50),
            single_flight,
            ..AgentConfig::default()
        }
    }

    async fn wait_terminal(source: &LocalSource, id: &ExpressionId) {
        tokio::time::timeout(Duration::from_secs(60), async {
            while !source.store.get(id).unwrap().is_terminal() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("expression did not finish in time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_computes_expressions() {
        let source = Arc::new(LocalSource::new(100));
        let a = source.store.submit("2+2*2").unwrap();
        let b = source.store.submit("(1+2)*(3+4)-5/2").unwrap();

        let pool = WorkerPool::spawn(&agent_config(4, false), source.clone());
        assert_eq!(pool.len(), 4);
        wait_terminal(&source, &a).await;
        wait_terminal(&source, &b).await;
        let stats = pool.shutdown().await;

        assert_eq!(source.store.get(&a).unwrap().result, Some(6.0));
        assert_eq!(source.store.get(&b).unwrap().result, Some(18.5));
        assert_eq!(stats.completed, 7);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_pool_overlaps_tasks() {
        let source = Arc::new(LocalSource::new(100));
        let id = source.store.submit("(1+2)*(3+4)").unwrap();

        let pool = WorkerPool::spawn(&agent_config(4, false), source.clone());
        wait_terminal(&source, &id).await;
        pool.shutdown().await;

        assert_eq!(source.store.get(&id).unwrap().result, Some(21.0));
        assert!(source.max_active.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_serializes_tasks() {
        let source = Arc::new(LocalSource::new(100));
        let id = source.store.submit("(1+2)*(3+4)").unwrap();

        let pool = WorkerPool::spawn(&agent_config(4, true), source.clone());
        wait_terminal(&source, &id).await;
        pool.shutdown().await;

        assert_eq!(source.store.get(&id).unwrap().result, Some(21.0));
        assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_division_by_zero_fails_expression() {
        let source = Arc::new(LocalSource::new(10));
        let id = source.store.submit("1+2/0").unwrap();

        let pool = WorkerPool::spawn(&agent_config(2, false), source.clone());
        wait_terminal(&source, &id).await;
        let stats = pool.shutdown().await;

        let expr = source.store.get(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Failed);
        assert_eq!(expr.result, None);
        assert_eq!(stats.failed, 1);
        assert_eq!(source.store.stats().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_computing_power_runs_one_worker() {
        let source = Arc::new(LocalSource::new(10));
        let pool = WorkerPool::spawn(&agent_config(0, false), source);
        assert_eq!(pool.len(), 1);
        pool.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_pool_stops_polling() {
        let source = Arc::new(LocalSource::new(10));
        let pool = WorkerPool::spawn(&agent_config(2, false), source.clone());

        tokio::time::sleep(Duration::from_millis(120)).await;
        drop(pool);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let settled = source.fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), settled);
        assert!(settled <= 2 * 5);
    }
}
