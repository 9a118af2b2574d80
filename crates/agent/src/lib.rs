//! Computing agent: a pool of workers that poll the orchestrator for
//! tasks, simulate their cost, resolve them and report back.

pub mod client;
pub mod error;
pub mod pool;
pub mod signal;
pub mod source;
pub mod worker;

pub use client::OrchestratorClient;
pub use error::AgentError;
pub use pool::WorkerPool;
pub use source::TaskSource;
pub use worker::{CycleOutcome, StatsSnapshot, Worker, WorkerStats};
