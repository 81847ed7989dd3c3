//! Vault logging bootstrap.
//!
//! # Responsibility
//! - Start file-based rolling logs from a resolved [`VaultConfig`].
//! - Keep panic reports in the log file free of credential text.
//!
//! # Invariants
//! - Logging starts at most once per process. Repeating the same target is a
//!   no-op; any other target is rejected.
//! - Level and directory arrive already validated by `config`.
//! - Log lines carry ids, counts and settings, never account names or `data`
//!   values.

use crate::config::VaultConfig;
use crate::service::lifecycle_service::StatePolicy;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, Level};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "aoki_vault";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static ACTIVE: OnceCell<ActiveLogging> = OnceCell::new();

/// Level and directory of the process-wide vault log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub level: Level,
    pub dir: PathBuf,
}

struct ActiveLogging {
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Logging bootstrap failure.
#[derive(Debug)]
pub enum LoggingError {
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with a different target.
    Conflict {
        active: LogTarget,
        requested: LogTarget,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already runs at level {} in `{}`; refusing level {} in `{}`",
                active.level,
                active.dir.display(),
                requested.level,
                requested.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::Conflict { .. } => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts vault logging as configured.
///
/// Returns `Ok(None)` without touching the logger when `log_dir` is unset,
/// otherwise the active target.
///
/// # Errors
/// - `CreateDir` / `Backend` when the log file cannot be opened.
/// - `Conflict` when logging already runs with another level or directory.
pub fn init_logging_from_config(config: &VaultConfig) -> Result<Option<LogTarget>, LoggingError> {
    let Some(dir) = config.log_dir.clone() else {
        return Ok(None);
    };
    let target = LogTarget {
        level: config.log_level,
        dir,
    };

    if start(&target)? {
        info!(
            "event=vault_start module=vault status=ok data_mode={} strict_lifecycle={} version={}",
            config.data_mode.as_str(),
            config.state_policy == StatePolicy::Strict,
            env!("CARGO_PKG_VERSION")
        );
    }
    Ok(Some(target))
}

/// Returns the active log target, or `None` before logging starts.
pub fn logging_status() -> Option<LogTarget> {
    ACTIVE.get().map(|active| active.target.clone())
}

/// Default level: `Debug` in debug builds, `Info` in release builds.
pub fn default_log_level() -> Level {
    if cfg!(debug_assertions) {
        Level::Debug
    } else {
        Level::Info
    }
}

/// Returns `true` when this call started the logger.
fn start(target: &LogTarget) -> Result<bool, LoggingError> {
    let mut started = false;
    let active = ACTIVE.get_or_try_init(|| {
        started = true;
        open_logger(target)
    })?;

    if active.target != *target {
        return Err(LoggingError::Conflict {
            active: active.target.clone(),
            requested: target.clone(),
        });
    }
    Ok(started)
}

fn open_logger(target: &LogTarget) -> Result<ActiveLogging, LoggingError> {
    std::fs::create_dir_all(&target.dir).map_err(|source| LoggingError::CreateDir {
        dir: target.dir.clone(),
        source,
    })?;

    let spec = LogSpecification::builder()
        .default(target.level.to_level_filter())
        .build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(target.dir.clone())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    install_panic_hook();
    info!(
        "event=logging_init module=vault status=ok level={} log_dir={}",
        target.level,
        target.dir.display()
    );

    Ok(ActiveLogging {
        target: target.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Why: panic messages can quote account names or field values; the
        // log file only gets the location, stderr still gets the full report.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!("event=panic_captured module=vault status=error location={location}");
        previous_hook(panic_info);
    }));
}
