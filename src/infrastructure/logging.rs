use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    config::{LogRotation, LoggingConfig},
    infrastructure::directories::ResolvedPaths,
};

/// HTTP and CDP internals log every request at info; keep them to warnings
/// unless the level is spelled out per target.
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "chromiumoxide", "tungstenite"];

static INIT: OnceCell<()> = OnceCell::new();
static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Console on stderr (stdout is left for `platforms` output) plus a rolling
/// file in the logs directory. Safe to call more than once.
pub fn init_tracing(logging: &LoggingConfig, paths: &ResolvedPaths) -> Result<()> {
    INIT.get_or_try_init::<_, anyhow::Error>(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(filter_directives(&logging.level)))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let appender = RollingFileAppender::new(
            rotation(logging.rotation),
            &paths.logs_dir,
            &logging.file_name,
        );
        let (file_writer, guard) = tracing_appender::non_blocking(appender);
        let _ = GUARD.set(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_ansi(logging.ansi),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_ansi(false),
            )
            .try_init()?;

        tracing::info!(
            logs = %paths.logs_dir.display(),
            file = %logging.file_name,
            rotation = ?logging.rotation,
            "tracing initialized"
        );
        Ok(())
    })?;
    Ok(())
}

/// A bare level gets the quiet-target directives appended; anything with
/// per-target directives is taken as written.
fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    std::iter::once(level.to_string())
        .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
        .collect::<Vec<_>>()
        .join(",")
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_quiets_transport_targets() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("chromiumoxide=warn"));
    }

    #[test]
    fn explicit_directives_are_kept_verbatim() {
        assert_eq!(filter_directives("engine=trace,info"), "engine=trace,info");
        assert!(filter_directives("  ").starts_with("info,"));
    }
}
