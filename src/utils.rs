use std::path::PathBuf;

use anyhow::bail;
use tracing_subscriber::EnvFilter;

/// Current time in UTC, the offset every stored timestamp uses.
pub fn utc_now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}

/// 初始化日志
///
/// Logs go to stdout, or to a daily rotated file when `log` names a directory.
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_log(log: Option<PathBuf>) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let subscriber_builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true);
    let (non_blocking, guard) = if let Some(log) = log {
        // output to file，daily rotate, non-blocking
        if !log.is_dir() {
            bail!("log path {} is not a directory", log.display());
        }
        let file_appender = tracing_appender::rolling::daily(log, "course_nav.log");
        tracing_appender::non_blocking(file_appender)
    } else {
        // output to stdout
        tracing_appender::non_blocking(std::io::stdout())
    };
    tracing::subscriber::set_global_default(
        subscriber_builder.with_writer(non_blocking).finish(),
    )?;
    Ok(guard)
}
