use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking::{self, WorkerGuard},
    rolling,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_DIR_ENV: &str = "RESERVEDB_LOG_DIR";
const LOG_FILE_PREFIX: &str = "reservedb.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static PANIC_HOOK: OnceLock<()> = OnceLock::new();

/// Installs the stderr and daily-rolling file subscribers. `fallback_dir` is
/// used when `RESERVEDB_LOG_DIR` is not set.
pub fn init(fallback_dir: &Path) -> Result<()> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let log_dir = resolve_log_dir(fallback_dir)?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, so console logs go to stderr.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    match subscriber.try_init() {
        Ok(_) => {
            let _ = FILE_GUARD.set(guard);
            install_panic_hook();
        }
        Err(_) => {
            // Subscriber already installed elsewhere; drop guard so the worker thread exits.
            drop(guard);
        }
    }

    Ok(())
}

fn resolve_log_dir(fallback_dir: &Path) -> Result<PathBuf> {
    match std::env::var_os(LOG_DIR_ENV).filter(|value| !value.is_empty()) {
        Some(dir) => {
            let path = PathBuf::from(dir);
            if path.is_absolute() {
                return Ok(path);
            }
            let base =
                std::env::current_dir().context("failed to resolve current working directory")?;
            Ok(base.join(path))
        }
        None => Ok(fallback_dir.to_path_buf()),
    }
}

fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                tracing::error!(
                    target: "panic",
                    file = location.file(),
                    line = location.line(),
                    message = %info
                );
            } else {
                tracing::error!(target: "panic", message = %info);
            }
            default_hook(info);
        }));
    });
}
