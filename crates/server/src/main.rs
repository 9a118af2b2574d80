mod api;
mod router;
mod state;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::state::AppState;

/// Orchestrator: accepts expressions, splits them into tasks and hands
/// those out to agents.
#[derive(Parser, Debug)]
#[command(name = "orchestrator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Evaluate an expression locally and print the value.
    Eval {
        /// Expression to evaluate, e.g. "(2+3)*4".
        expression: String,
    },
}

fn load_config() -> calc_core::Config {
    calc_core::config::load_dotenv();
    calc_core::Config::from_env()
}

async fn serve(config: calc_core::Config) -> anyhow::Result<()> {
    config.log_summary();

    let addr = config.server.bind_addr();
    let state = Arc::new(AppState::new(config));
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(load_config()).await?,
        Command::Eval { expression } => {
            let value = calc_compiler::evaluate(&expression)?;
            println!("{value}");
        }
    }

    Ok(())
}
