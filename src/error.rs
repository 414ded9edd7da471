//! Error types.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by logger construction and reconfiguration.
///
/// Emitting a record never returns an error; sink write failures are
/// reported on stderr instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A level name outside `debug|info|warn|error|panic|fatal` (strict parsing only).
    #[error("unknown log level: {0:?}")]
    UnknownLevel(String),

    /// The log file path has no file name component.
    #[error("log file path has no file name: {0}")]
    InvalidPath(PathBuf),

    /// The directory holding the log file could not be created.
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The rolling file appender could not be initialized.
    #[error("failed to open rolling log file {path}: {source}")]
    FileSink {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    /// A `log` crate backend is already installed for this process.
    #[error("a global `log` backend is already installed")]
    SetLogger(#[from] log::SetLoggerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
