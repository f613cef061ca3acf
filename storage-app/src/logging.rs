// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use crate::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_PREFIX: &str = "storage-details.log";
const KEEP_DAYS: u64 = 7;

/// Log to stderr, and to a daily file when the config asks for it.
///
/// `RUST_LOG` overrides the configured level.
pub(crate) fn init(config: &Config) {
    let level = config.log_level.as_directive();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!(
            "warn,storage_details={level},storage_udisks={level}"
        ))
        .unwrap_or_else(|_| EnvFilter::new(level))
    });

    // stdout carries the program output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    if !config.log_to_disk {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return;
    }

    match file_writer() {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::SystemTime);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("storage-details: failed to initialize file logging: {e:#}");
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
        }
    }
}

fn file_writer() -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (dir, prefix) = resolve_log_location();

    if let Err(e) = fs::create_dir_all(&dir) {
        return Err(anyhow::anyhow!(
            "create log directory failed: {} ({})",
            dir.display(),
            e
        ));
    }

    cleanup_old_logs(&dir, &prefix);

    let appender = tracing_appender::rolling::daily(&dir, &prefix);
    Ok(tracing_appender::non_blocking(appender))
}

fn resolve_log_location() -> (PathBuf, OsString) {
    if let Some(file) = std::env::var_os("STORAGE_DETAILS_LOG_FILE") {
        let path = PathBuf::from(file);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_log_dir);
        let prefix = path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_LOG_PREFIX));
        return (dir, prefix);
    }

    if let Some(dir) = std::env::var_os("STORAGE_DETAILS_LOG_DIR") {
        return (PathBuf::from(dir), OsString::from(DEFAULT_LOG_PREFIX));
    }

    (default_log_dir(), OsString::from(DEFAULT_LOG_PREFIX))
}

fn default_log_dir() -> PathBuf {
    if let Some(xdg_state) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(xdg_state).join("storage-details").join("logs");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("storage-details")
            .join("logs");
    }

    PathBuf::from("/tmp").join("storage-details").join("logs")
}

fn cleanup_old_logs(dir: &Path, prefix: &OsString) {
    let cutoff = SystemTime::now().checked_sub(Duration::from_secs(KEEP_DAYS * 24 * 60 * 60));
    let Some(cutoff) = cutoff else { return };

    let prefix = prefix.to_string_lossy();

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        // Only files of our rolling appender
        if !entry.file_name().to_string_lossy().starts_with(prefix.as_ref()) {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        let Ok(modified) = modified else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        if let Err(e) = fs::remove_file(entry.path()) {
            tracing::debug!("Failed to remove old log {}: {e}", entry.path().display());
        }
    }
}
