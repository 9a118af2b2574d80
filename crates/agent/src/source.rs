//! Where workers get tasks from and send results to.

use async_trait::async_trait;

use calc_core::wire::TaskReport;
use calc_core::ReadyTask;

use crate::error::AgentError;

/// Trait for task providers.
///
/// The production implementation talks HTTP to the orchestrator
/// ([`crate::OrchestratorClient`]); tests plug in an in-process store.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Take the next dispatchable task.
    ///
    /// `Ok(None)` means nothing is available right now. That is a normal
    /// condition, not a failure.
    async fn fetch(&self) -> Result<Option<ReadyTask>, AgentError>;

    /// Deliver the outcome of a previously fetched task.
    async fn report(&self, report: &TaskReport) -> Result<(), AgentError>;
}
