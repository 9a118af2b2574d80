use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::Operator;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_ms(profile: &str, key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(profiled_env_parse(profile, key, default_ms))
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub timings: OperationTimes,
    pub scheduler: SchedulerConfig,
    pub agent: AgentConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CALC_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CALC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            timings: OperationTimes::from_env_profiled(p),
            scheduler: SchedulerConfig::from_env_profiled(p),
            agent: AgentConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  timings:    + {:?}, - {:?}, * {:?}, / {:?}",
            self.timings.addition,
            self.timings.subtraction,
            self.timings.multiplication,
            self.timings.division
        );
        match self.scheduler.lease {
            Some(lease) => tracing::info!("  scheduler:  lease={:?}", lease),
            None => tracing::info!("  scheduler:  leases disabled"),
        }
        tracing::info!(
            "  agent:      url={}, workers={}, single_flight={}",
            self.agent.orchestrator_url,
            self.agent.computing_power,
            self.agent.single_flight
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8080),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

// ── Operation times ───────────────────────────────────────────

/// Simulated execution delay per operator, stamped on tasks at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationTimes {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            addition: profiled_env_ms(p, "TIME_ADDITION_MS", 100),
            subtraction: profiled_env_ms(p, "TIME_SUBTRACTION_MS", 100),
            multiplication: profiled_env_ms(p, "TIME_MULTIPLICATIONS_MS", 200),
            division: profiled_env_ms(p, "TIME_DIVISIONS_MS", 200),
        }
    }

    /// The same delay for every operator.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            addition: delay,
            subtraction: delay,
            multiplication: delay,
            division: delay,
        }
    }

    pub fn for_operator(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.addition,
            Operator::Sub => self.subtraction,
            Operator::Mul => self.multiplication,
            Operator::Div => self.division,
        }
    }
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self {
            addition: Duration::from_millis(100),
            subtraction: Duration::from_millis(100),
            multiplication: Duration::from_millis(200),
            division: Duration::from_millis(200),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long a dispatched task may stay unreported before it is handed
    /// out again. `None` keeps dispatch final.
    pub lease: Option<Duration>,
}

impl SchedulerConfig {
    fn from_env_profiled(p: &str) -> Self {
        let lease_ms: u64 = profiled_env_parse(p, "TASK_LEASE_MS", 0);
        Self {
            lease: (lease_ms > 0).then(|| Duration::from_millis(lease_ms)),
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub orchestrator_url: String,
    /// Number of concurrent worker loops.
    pub computing_power: usize,
    /// Sleep between polls when no task is available.
    pub poll_interval: Duration,
    /// Grace period before the first poll, so the orchestrator can come up.
    pub startup_delay: Duration,
    /// Allow only one task in flight across the whole pool.
    pub single_flight: bool,
}

impl AgentConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            orchestrator_url: profiled_env_or(p, "ORCHESTRATOR_URL", "http://localhost:8080"),
            computing_power: profiled_env_parse(p, "COMPUTING_POWER", 4),
            poll_interval: profiled_env_ms(p, "AGENT_POLL_INTERVAL_MS", 1000),
            startup_delay: profiled_env_ms(p, "AGENT_STARTUP_DELAY_MS", 5000),
            single_flight: profiled_env_bool(p, "AGENT_SINGLE_FLIGHT", false),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8080".to_string(),
            computing_power: 4,
            poll_interval: Duration::from_secs(1),
            startup_delay: Duration::from_secs(5),
            single_flight: false,
        }
    }
}
