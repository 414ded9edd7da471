//! Immutable record pipeline.
//!
//! A `Pipeline` bundles everything that is fixed between reconfigurations:
//! encoder, sinks, logger name, caller skip and stack trace threshold. The
//! level gate lives outside it so it can change without a rebuild.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use chrono::Local;

use super::caller;
use super::config::{FatalAction, LoggerConfig};
use crate::encoding::{Entry, Field, JsonEncoder};
use crate::error::Result;
use crate::level::Level;
use crate::sink::{FanOut, RollingFileSink, Sink};

pub struct Pipeline {
    encoder: JsonEncoder,
    sink: Arc<dyn Sink>,
    file: Option<Arc<RollingFileSink>>,
    name: Option<String>,
    caller_skip: usize,
    stacktrace_level: Level,
    on_fatal: FatalAction,
}

impl Pipeline {
    /// Build a pipeline for `config`.
    ///
    /// The rolling file sink of `previous` is reused when its file
    /// configuration is unchanged; otherwise a new one is opened. On error
    /// nothing is replaced and the caller keeps using `previous`.
    pub fn build(
        config: &LoggerConfig,
        console: &Arc<dyn Sink>,
        previous: Option<&Pipeline>,
    ) -> Result<Self> {
        let file = match &config.output.file {
            None => None,
            Some(file_config) => {
                let reusable = previous
                    .and_then(|p| p.file.as_ref())
                    .filter(|sink| sink.config() == file_config);
                match reusable {
                    Some(sink) => Some(Arc::clone(sink)),
                    None => Some(Arc::new(RollingFileSink::open(file_config)?)),
                }
            }
        };
        Ok(Self::assemble(config, console, file))
    }

    /// Assemble a pipeline around an already opened file sink.
    ///
    /// `file` must be the sink for `config.output.file`.
    pub fn assemble(
        config: &LoggerConfig,
        console: &Arc<dyn Sink>,
        file: Option<Arc<RollingFileSink>>,
    ) -> Self {
        let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(2);
        if config.output.console {
            sinks.push(Arc::clone(console));
        }
        if let Some(file) = &file {
            sinks.push(Arc::clone(file) as Arc<dyn Sink>);
        }
        let sink = if sinks.len() == 1 {
            sinks.remove(0)
        } else {
            Arc::new(FanOut::new(sinks))
        };

        Self {
            encoder: JsonEncoder::new(config.encoder.clone()),
            sink,
            file,
            name: config.project_name.clone(),
            caller_skip: config.caller_skip,
            stacktrace_level: config.stacktrace_level,
            on_fatal: config.on_fatal,
        }
    }

    pub fn file_sink(&self) -> Option<&Arc<RollingFileSink>> {
        self.file.as_ref()
    }

    /// Logger name written under the name key.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn on_fatal(&self) -> FatalAction {
        self.on_fatal
    }

    /// Encode and write one record attributed to `location`.
    pub(crate) fn emit_at(
        &self,
        level: Level,
        message: &str,
        context: &[Field],
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        let caller = caller::resolve(location, self.caller_skip);
        self.write(Entry {
            time: Local::now(),
            level,
            name: self.name.as_deref(),
            caller: Some(caller),
            message,
            context,
            fields,
            stack: None,
        });
    }

    /// Encode and write one record. Fills in the name and, above the
    /// threshold, the stack trace.
    pub(crate) fn write<'a>(&'a self, mut entry: Entry<'a>) {
        if entry.name.is_none() {
            entry.name = self.name.as_deref();
        }
        if entry.level >= self.stacktrace_level {
            entry.stack = Some(caller::capture_stack());
        }

        let line = self.encoder.encode(&entry);
        if let Err(e) = self.sink.write_line(&line) {
            // Not through `log`: with the bridge installed that would recurse.
            eprintln!("{} zlog: failed to write log record: {}", Local::now(), e);
        }
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.sink.flush()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("encoder", &self.encoder)
            .field("file", &self.file.as_ref().map(|f| f.config()))
            .field("name", &self.name)
            .field("caller_skip", &self.caller_skip)
            .field("stacktrace_level", &self.stacktrace_level)
            .field("on_fatal", &self.on_fatal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::FileConfig;
    use crate::sink::MemorySink;

    fn memory() -> (Arc<MemorySink>, Arc<dyn Sink>) {
        let sink = Arc::new(MemorySink::new());
        let console: Arc<dyn Sink> = sink.clone();
        (sink, console)
    }

    #[test]
    fn test_emit_fills_name_and_caller() {
        let (memory, console) = memory();
        let config = LoggerConfig::default().with_project_name("billing");
        let pipeline = Pipeline::assemble(&config, &console, None);

        pipeline.emit_at(Level::Info, "charged", &[], &[], Location::caller());

        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["N"], "billing");
        assert_eq!(records[0]["M"], "charged");
        assert!(records[0]["C"].as_str().unwrap().starts_with("pipeline/builder.rs:"));
        assert!(records[0].get("S").is_none());
    }

    #[test]
    fn test_stack_above_threshold() {
        let (memory, console) = memory();
        let config = LoggerConfig::default().with_stacktrace_level(Level::Error);
        let pipeline = Pipeline::assemble(&config, &console, None);

        pipeline.emit_at(Level::Warn, "slow", &[], &[], Location::caller());
        pipeline.emit_at(Level::Error, "failed", &[], &[], Location::caller());

        let records = memory.records();
        assert!(records[0].get("S").is_none());
        assert!(records[1]["S"].is_string());
    }

    #[test]
    fn test_console_disabled_discards() {
        let (memory, console) = memory();
        let config = LoggerConfig::default().with_console(false);
        let pipeline = Pipeline::assemble(&config, &console, None);

        pipeline.emit_at(Level::Error, "nowhere", &[], &[], Location::caller());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_rebuild_reuses_unchanged_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let (_, console) = memory();
        let config =
            LoggerConfig::default().with_file(FileConfig::new(dir.path().join("app.log"), 24, 7));

        let first = Pipeline::build(&config, &console, None).unwrap();
        let same = Pipeline::build(&config.clone().with_caller_skip(1), &console, Some(&first)).unwrap();
        assert!(Arc::ptr_eq(first.file_sink().unwrap(), same.file_sink().unwrap()));

        let moved = config.with_file(FileConfig::new(dir.path().join("other.log"), 24, 7));
        let other = Pipeline::build(&moved, &console, Some(&same)).unwrap();
        assert!(!Arc::ptr_eq(same.file_sink().unwrap(), other.file_sink().unwrap()));
    }

    #[test]
    fn test_console_and_file_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let (memory, console) = memory();
        let config =
            LoggerConfig::default().with_file(FileConfig::new(dir.path().join("both.log"), 0, 0));

        let pipeline = Pipeline::build(&config, &console, None).unwrap();
        pipeline.emit_at(Level::Info, "twice", &[], &[], Location::caller());
        pipeline.flush().unwrap();

        assert_eq!(memory.len(), 1);
        let written = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
            .collect::<String>();
        assert!(written.contains("\"M\":\"twice\""));
    }
}
