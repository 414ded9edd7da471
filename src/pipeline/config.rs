//! Logger configuration snapshot.
//!
//! A `LoggerConfig` is a plain value. Setters on `Logger` clone the current
//! snapshot, change one field and build a new pipeline from the result.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoding::EncoderConfig;
use crate::level::Level;

/// Rotating log file target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub path: PathBuf,
    /// Rotation interval in hours; `0` never rotates.
    pub rotation_hours: u32,
    /// Number of segments to keep; `0` keeps all of them.
    pub max_files: usize,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>, rotation_hours: u32, max_files: usize) -> Self {
        Self {
            path: path.into(),
            rotation_hours,
            max_files,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            rotation_hours: 24,
            max_files: 7,
        }
    }
}

/// Where records go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write to the console sink (stdout unless replaced).
    pub console: bool,
    pub file: Option<FileConfig>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            file: None,
        }
    }
}

/// What `fatal` does after the record is written and sinks are flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalAction {
    /// `std::process::exit` with the given code.
    Exit(i32),
    /// Panic like `panic`, so tests and supervisors can catch it.
    Panic,
}

impl Default for FatalAction {
    fn default() -> Self {
        FatalAction::Exit(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Initial threshold. The live threshold is changed with
    /// `Logger::set_log_level` and is not part of the pipeline.
    pub level: Level,
    /// Written under the name key on every record.
    pub project_name: Option<String>,
    /// Extra stack frames to skip past the immediate call site.
    pub caller_skip: usize,
    /// Records at or above this level carry a stack trace.
    pub stacktrace_level: Level,
    pub output: OutputConfig,
    pub encoder: EncoderConfig,
    pub on_fatal: FatalAction,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            project_name: None,
            caller_skip: 0,
            stacktrace_level: Level::Panic,
            output: OutputConfig::default(),
            encoder: EncoderConfig::default(),
            on_fatal: FatalAction::default(),
        }
    }
}

impl LoggerConfig {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// An empty name leaves the current one in place.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.project_name = Some(name);
        }
        self
    }

    pub fn with_caller_skip(mut self, skip: usize) -> Self {
        self.caller_skip = skip;
        self
    }

    pub fn with_stacktrace_level(mut self, level: Level) -> Self {
        self.stacktrace_level = level;
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.output.console = enabled;
        self
    }

    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.output.file = Some(file);
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_fatal_action(mut self, action: FatalAction) -> Self {
        self.on_fatal = action;
        self
    }
}
