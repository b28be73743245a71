use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. `debug` raises the default level from `info` to
/// `debug` and lets `RUST_LOG` override it. With `log_file` set, output goes
/// to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug the level is forced so a stray `RUST_LOG` in the
    // environment cannot turn on verbose output.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let file_target = log_file.and_then(|path| {
        let file_name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Some((dir, file_name))
    });

    let _ = match file_target {
        Some((dir, file_name)) => {
            let appender = tracing_appender::rolling::never(dir, file_name);
            builder.with_writer(appender).with_ansi(false).try_init()
        }
        None => builder.try_init(),
    };
}
