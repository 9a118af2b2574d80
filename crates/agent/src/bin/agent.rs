//! agent: computing agent that evaluates arithmetic tasks for an orchestrator.
//!
//! Polls `GET {ORCHESTRATOR_URL}/internal/task` from `COMPUTING_POWER`
//! workers and posts each result back to `POST /internal/task`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use calc_agent::signal::shutdown_signal;
use calc_agent::{OrchestratorClient, WorkerPool};

// ── CLI ─────────────────────────────────────────────────────────────

/// Computing agent. Flags override the corresponding environment settings.
#[derive(Parser, Debug)]
#[command(name = "agent", version, about)]
struct Cli {
    /// Orchestrator base URL.
    #[arg(long)]
    orchestrator_url: Option<String>,

    /// Number of concurrent workers.
    #[arg(long)]
    computing_power: Option<usize>,

    /// Allow only one task in flight across all workers.
    #[arg(long)]
    single_flight: bool,

    /// Delay before the first poll, in milliseconds.
    #[arg(long)]
    startup_delay_ms: Option<u64>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    calc_core::config::load_dotenv();
    let mut config = calc_core::Config::from_env();
    if let Some(url) = cli.orchestrator_url {
        config.agent.orchestrator_url = url;
    }
    if let Some(n) = cli.computing_power {
        config.agent.computing_power = n;
    }
    if cli.single_flight {
        config.agent.single_flight = true;
    }
    if let Some(ms) = cli.startup_delay_ms {
        config.agent.startup_delay = Duration::from_millis(ms);
    }
    config.log_summary();

    let client = OrchestratorClient::new(&config.agent.orchestrator_url);

    if !config.agent.startup_delay.is_zero() {
        info!(delay = ?config.agent.startup_delay, "waiting for orchestrator");
        tokio::select! {
            _ = tokio::time::sleep(config.agent.startup_delay) => {}
            _ = shutdown_signal() => {
                info!("shutdown requested before start");
                return Ok(());
            }
        }
    }

    let pool = WorkerPool::spawn(&config.agent, Arc::new(client));

    shutdown_signal().await;
    info!("shutdown signal received, waiting for workers");
    pool.shutdown().await;
    info!("agent exited cleanly");

    Ok(())
}
