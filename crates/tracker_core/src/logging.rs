//! Process-wide logger for tracker binaries.
//!
//! Events go to rolling files when a log directory is configured and to
//! stderr otherwise. The logger starts once; a later call must ask for the
//! same level and sink.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "parcel_tracker";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// Rolling `parcel_tracker*.log` files inside an absolute directory.
    Files(PathBuf),
}

impl LogSink {
    /// `debug`/`info` for files depending on build mode; stderr stays at
    /// `warn` so console output is not drowned in events.
    pub fn default_level(&self) -> &'static str {
        match self {
            Self::Stderr => "warn",
            Self::Files(_) if cfg!(debug_assertions) => "debug",
            Self::Files(_) => "info",
        }
    }
}

impl Display for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("stderr"),
            Self::Files(dir) => write!(f, "files in `{}`", dir.display()),
        }
    }
}

struct ActiveLogger {
    level: &'static str,
    sink: LogSink,
    _handle: LoggerHandle,
}

/// Starts the process logger, or confirms the running one matches.
///
/// # Errors
/// - `level` is not one of `trace|debug|info|warn|error`.
/// - The log directory cannot be created or the backend fails to start.
/// - A logger with a different level or sink is already running.
pub fn init_logging(level: &str, sink: LogSink) -> Result<(), String> {
    let level = normalize_level(level)?;
    let active = ACTIVE_LOGGER.get_or_try_init(|| start(level, sink.clone()))?;

    if active.level != level || active.sink != sink {
        return Err(format!(
            "logger already running at level `{}` to {}; refusing to switch to `{}` to {}",
            active.level, active.sink, level, sink
        ));
    }
    Ok(())
}

fn start(level: &'static str, sink: LogSink) -> Result<ActiveLogger, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match &sink {
        LogSink::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
        LogSink::Files(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    let handle = logger
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    info!(
        "event=logging_init module=tracker status=ok level={level} sink={sink} version={}",
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        sink,
        _handle: handle,
    })
}

/// Maps a user-supplied level onto one of the canonical level names.
pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

/// Accepts only absolute, non-blank directories for file logging.
pub(crate) fn log_dir_sink(dir: &str) -> Result<LogSink, String> {
    let dir = dir.trim();
    if dir.is_empty() {
        return Err("log directory cannot be empty".to_string());
    }
    if !Path::new(dir).is_absolute() {
        return Err(format!("log directory must be an absolute path, got `{dir}`"));
    }
    Ok(LogSink::Files(PathBuf::from(dir)))
}

#[cfg(test)]
mod tests {
    use super::{init_logging, log_dir_sink, normalize_level, LogSink};

    #[test]
    fn levels_normalize_to_canonical_names() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn log_dir_must_be_absolute() {
        assert!(log_dir_sink("logs/dev").unwrap_err().contains("absolute"));
        assert!(log_dir_sink("   ").is_err());
        assert_eq!(
            log_dir_sink("/var/log/tracker").unwrap(),
            LogSink::Files("/var/log/tracker".into())
        );
    }

    #[test]
    fn stderr_sink_defaults_to_warn() {
        assert_eq!(LogSink::Stderr.default_level(), "warn");
        assert_ne!(LogSink::Files("/tmp".into()).default_level(), "warn");
    }

    #[test]
    fn second_init_must_match_running_logger() {
        init_logging("error", LogSink::Stderr).unwrap();
        init_logging("ERROR", LogSink::Stderr).unwrap();

        let err = init_logging("debug", LogSink::Stderr).unwrap_err();
        assert!(err.contains("refusing to switch"));

        let dir = tempfile::tempdir().unwrap();
        let err = init_logging("error", LogSink::Files(dir.path().to_path_buf())).unwrap_err();
        assert!(err.contains("refusing to switch"));
    }
}
