//! Tracing subscriber setup shared by the binaries.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "logs/heartrisk.log";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(String),
}

impl LogTarget {
    /// Resolve from `HEARTRISK_LOG_MODE` (`stdout` | `file`) and `HEARTRISK_LOG_FILE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("HEARTRISK_LOG_MODE").as_deref() {
            Some("file") => Self::File(
                lookup("HEARTRISK_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            ),
            _ => Self::Stdout,
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines on drop; keep it alive for the
/// lifetime of the process.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init() -> std::io::Result<WorkerGuard> {
    let (writer, guard) = match LogTarget::from_env() {
        LogTarget::File(log_file) => {
            if let Some(parent) = Path::new(&log_file).parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults_to_stdout() {
        assert_eq!(LogTarget::from_lookup(|_| None), LogTarget::Stdout);
        assert_eq!(
            LogTarget::from_lookup(|k| (k == "HEARTRISK_LOG_MODE").then(|| "verbose".to_string())),
            LogTarget::Stdout
        );
    }

    #[test]
    fn test_file_target() {
        let target = LogTarget::from_lookup(|k| match k {
            "HEARTRISK_LOG_MODE" => Some("file".to_string()),
            "HEARTRISK_LOG_FILE" => Some("/tmp/h.log".to_string()),
            _ => None,
        });
        assert_eq!(target, LogTarget::File("/tmp/h.log".to_string()));

        let target =
            LogTarget::from_lookup(|k| (k == "HEARTRISK_LOG_MODE").then(|| "file".to_string()));
        assert_eq!(target, LogTarget::File(DEFAULT_LOG_FILE.to_string()));
    }
}
