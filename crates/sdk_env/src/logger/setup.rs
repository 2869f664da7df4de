//!
//! Setup logging subsystem.
//!

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::config;

/// Keeps the non-blocking log writers alive. Logs stop being flushed once it is dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    _log_guards: Vec<WorkerGuard>,
}

///
/// Setup logging sub-system.
/// Expects config and list of names of crates to watch on the console.
///
/// Returns an error if a global subscriber was already installed.
///
pub fn setup<Str: AsRef<str>>(
    conf: &config::Log,
    service_name: &str,
    crates_to_watch: impl IntoIterator<Item = Str>,
) -> Result<TelemetryGuard, tracing_subscriber::util::TryInitError> {
    let mut guards = Vec::new();

    let file_layer = if conf.file.enabled {
        let mut path = crate::env::workspace_path();
        path.push(PathBuf::from(&conf.file.path));
        let file_appender = tracing_appender::rolling::hourly(&path, &conf.file.file_name);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        let file_filter = filter::Targets::new().with_default(conf.file.level.into_level());
        Some(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
    } else {
        None
    };

    let console_layer = if conf.console.enabled {
        let (console_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);

        let level = conf.console.level.into_level();
        let mut console_filter = filter::Targets::new().with_default(Level::WARN);
        for acrate in crates_to_watch {
            console_filter = console_filter.with_target(acrate.as_ref(), level);
        }

        let layer = match conf.console.log_format {
            config::LogFormat::Default => fmt::layer()
                .with_timer(fmt::time::time())
                .pretty()
                .with_writer(console_writer)
                .boxed(),
            config::LogFormat::Json => fmt::layer()
                .json()
                .with_writer(console_writer)
                .boxed(),
        };
        Some(layer.with_filter(console_filter))
    } else {
        None
    };

    // Use 'RUST_LOG' environment variable will override the config settings
    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::TRACE.into())
                .from_env_lossy(),
        )
        .try_init()?;

    tracing::debug!(service = service_name, "logger initialized");

    // Returning the WorkerGuard for logs to be printed until it is dropped
    Ok(TelemetryGuard {
        _log_guards: guards,
    })
}
