//! File logging setup.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::SimConfig;

/// Platform cache directory for simulator logs.
///
/// - macOS: `~/Library/Caches/battle-sim/logs`
/// - Linux: `~/.cache/battle-sim/logs` (or `$XDG_CACHE_HOME/battle-sim/logs`)
/// - Windows: `%LOCALAPPDATA%\battle-sim\logs`
/// - Fallback: `/tmp/battle-sim/logs`
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "battle-sim")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/battle-sim"))
        .join("logs")
}

fn session_id(config: &SimConfig) -> String {
    config.session_id.clone().unwrap_or_else(|| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        format!("session_{timestamp}_seed{}", config.seed)
    })
}

/// Routes tracing output to `<log dir>/<session>/battle.log`.
///
/// `RUST_LOG` refines the default `info` level.
pub fn init(config: &SimConfig) -> Result<WorkerGuard> {
    let session_id = session_id(config);
    let log_dir = config
        .log_dir
        .clone()
        .unwrap_or_else(default_log_dir)
        .join(&session_id);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "battle.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(session = %session_id, "Logging initialized");
    tracing::info!("Log file: {}/battle.log", log_dir.display());

    Ok(guard)
}
