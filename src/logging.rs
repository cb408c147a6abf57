use std::{fs, io, path::Path};

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "logs/run.log";

/// Log files kept on disk, the active one included.
pub const MAX_LOG_FILES: usize = 4;

fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    std::env::var("APIHARNESS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(fallback),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
}

/// Daily-rotated appender for `path`: `logs/run.log` becomes
/// `logs/run.<date>.log`, and only the newest [`MAX_LOG_FILES`] are kept.
fn rolling_appender(path: &Path) -> io::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let prefix = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(MAX_LOG_FILES);
    if let Some(extension) = path.extension() {
        builder = builder.filename_suffix(extension.to_string_lossy());
    }
    builder.build(dir).map_err(io::Error::other)
}

/// Installs the global subscriber: console output on stderr plus, when
/// `log_file` is given, plain-text lines written to a rotating file.
///
/// Keep the returned guard alive for the whole run; dropping it flushes and
/// stops the file writer. Calling this again installs nothing and returns
/// `None`.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_file {
        Some(path) => match rolling_appender(path) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!("Failed to open log file {}: {}", path.display(), err);
                (None, None)
            }
        },
        None => (None, None),
    };

    let console_layer = fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok()
        .and(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn log_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn init_logging_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/run.log");
        let _guard = init_logging(false, Some(&path));
        assert!(init_logging(true, None).is_none());
        assert!(temp.path().join("nested").is_dir());
    }

    #[test]
    fn appender_names_files_after_the_log_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("logs/run.log");
        drop(rolling_appender(&path).unwrap());

        let files = log_files(&temp.path().join("logs"));
        assert_eq!(files.len(), 1, "{files:?}");
        assert!(files[0].starts_with("run."), "{files:?}");
        assert!(files[0].ends_with(".log"), "{files:?}");
    }

    #[test]
    fn extensionless_path_uses_stem_only() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("harness");
        drop(rolling_appender(&path).unwrap());

        let files = log_files(temp.path());
        assert_eq!(files.len(), 1, "{files:?}");
        assert!(files[0].starts_with("harness."), "{files:?}");
    }
}
