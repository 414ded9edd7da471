//! Logger handle.
//!
//! A `Logger` is a cheap, clonable handle. All clones share one level gate
//! and one pipeline slot; reconfiguring through any clone affects them all.
//! Child loggers made with `with` add context fields and share the rest.

pub mod bridge;

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::encoding::Field;
use crate::error::Result;
use crate::level::{AtomicLevel, Level};
use crate::pipeline::{FatalAction, FileConfig, LoggerConfig, Pipeline};
use crate::sink::{ConsoleSink, Sink};

struct Core {
    level: AtomicLevel,
    pipeline: ArcSwap<Pipeline>,
    settings: Mutex<Settings>,
}

/// Inputs to the next rebuild. Rebuilds serialize on this lock; logging
/// never takes it.
struct Settings {
    config: LoggerConfig,
    console: Arc<dyn Sink>,
}

#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
    context: Arc<[Field]>,
}

macro_rules! leveled_methods {
    ($level:expr, $plain:ident, $formatted:ident, $with_fields:ident) => {
        #[track_caller]
        pub fn $plain(&self, msg: impl fmt::Display) {
            self.emit($level, format_args!("{}", msg), &[]);
        }

        #[track_caller]
        pub fn $formatted(&self, args: fmt::Arguments<'_>) {
            self.emit($level, args, &[]);
        }

        #[track_caller]
        pub fn $with_fields(&self, msg: impl fmt::Display, fields: &[Field]) {
            self.emit($level, format_args!("{}", msg), fields);
        }
    };
}

macro_rules! terminating_methods {
    ($level:expr, $plain:ident, $formatted:ident, $with_fields:ident) => {
        #[track_caller]
        pub fn $plain(&self, msg: impl fmt::Display) -> ! {
            self.terminate($level, format_args!("{}", msg), &[])
        }

        #[track_caller]
        pub fn $formatted(&self, args: fmt::Arguments<'_>) -> ! {
            self.terminate($level, args, &[])
        }

        #[track_caller]
        pub fn $with_fields(&self, msg: impl fmt::Display, fields: &[Field]) -> ! {
            self.terminate($level, format_args!("{}", msg), fields)
        }
    };
}

impl Logger {
    /// Logger with the default configuration, writing JSON lines to stdout.
    pub fn new() -> Self {
        let config = LoggerConfig::default();
        let console: Arc<dyn Sink> = Arc::new(ConsoleSink::stdout());
        let pipeline = Pipeline::assemble(&config, &console, None);
        Self::from_parts(config, console, pipeline)
    }

    /// Build a logger from `config`, with stdout as the console sink.
    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        Self::with_console_sink(config, Arc::new(ConsoleSink::stdout()))
    }

    /// Build a logger whose console output goes to `console` instead of stdout.
    pub fn with_console_sink(config: LoggerConfig, console: Arc<dyn Sink>) -> Result<Self> {
        let pipeline = Pipeline::build(&config, &console, None)?;
        Ok(Self::from_parts(config, console, pipeline))
    }

    fn from_parts(config: LoggerConfig, console: Arc<dyn Sink>, pipeline: Pipeline) -> Self {
        let core = Core {
            level: AtomicLevel::new(config.level),
            pipeline: ArcSwap::from_pointee(pipeline),
            settings: Mutex::new(Settings { config, console }),
        };
        Self {
            core: Arc::new(core),
            context: Arc::from(Vec::new()),
        }
    }

    /// Child logger that adds `fields` to every record it emits.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let context: Vec<Field> = self.context.iter().cloned().chain(fields).collect();
        Logger {
            core: Arc::clone(&self.core),
            context: context.into(),
        }
    }

    leveled_methods!(Level::Debug, debug, debugf, debugw);
    leveled_methods!(Level::Info, info, infof, infow);
    leveled_methods!(Level::Warn, warn, warnf, warnw);
    leveled_methods!(Level::Error, error, errorf, errorw);
    terminating_methods!(Level::Panic, panic, panicf, panicw);
    terminating_methods!(Level::Fatal, fatal, fatalf, fatalw);

    /// Emit a record at `level` if it passes the gate.
    #[track_caller]
    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>, fields: &[Field]) {
        if !self.core.level.enabled(level) {
            return;
        }
        let message = render(args);
        self.core
            .pipeline
            .load()
            .emit_at(level, &message, &self.context, fields, Location::caller());
    }

    /// Write the record (if enabled), then panic or run the fatal action.
    ///
    /// The panic happens even when the record is gated out.
    #[track_caller]
    fn terminate(&self, level: Level, args: fmt::Arguments<'_>, fields: &[Field]) -> ! {
        let message = render(args);
        let pipeline = self.core.pipeline.load_full();
        if self.core.level.enabled(level) {
            pipeline.emit_at(level, &message, &self.context, fields, Location::caller());
        }
        if level == Level::Fatal {
            if let Err(e) = pipeline.flush() {
                eprintln!("{} zlog: failed to flush before exit: {}", chrono::Local::now(), e);
            }
            if let FatalAction::Exit(code) = pipeline.on_fatal() {
                std::process::exit(code);
            }
        }
        panic!("{}", message)
    }

    pub fn level(&self) -> Level {
        self.core.level.level()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.core.level.enabled(level)
    }

    /// Set the threshold by name. Unknown names select `debug`.
    ///
    /// Takes effect immediately on all threads; no rebuild.
    pub fn set_log_level(&self, level: &str) {
        self.set_level(Level::from_name_lossy(level));
    }

    pub fn set_level(&self, level: Level) {
        self.core.level.set_level(level);
    }

    /// Name written under the `N` key. Once set there is no unset; an empty
    /// name is ignored.
    pub fn set_project_name(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.relayout(|settings| settings.config.project_name = Some(name.to_string()));
    }

    /// Threshold for attaching stack traces, by name. Unknown names select `debug`.
    pub fn set_stacktrace_level(&self, level: &str) {
        let level = Level::from_name_lossy(level);
        self.relayout(|settings| settings.config.stacktrace_level = level);
    }

    /// Report the call site `skip` frames further out than the immediate caller.
    pub fn set_caller_skip(&self, skip: usize) {
        self.relayout(|settings| settings.config.caller_skip = skip);
    }

    pub fn set_console(&self, enabled: bool) {
        self.relayout(|settings| settings.config.output.console = enabled);
    }

    /// Replace the console destination (stdout by default).
    pub fn set_console_sink(&self, sink: Arc<dyn Sink>) {
        self.relayout(|settings| settings.console = sink);
    }

    pub fn set_fatal_action(&self, action: FatalAction) {
        self.relayout(|settings| settings.config.on_fatal = action);
    }

    /// Send records to a rotating file instead of the console.
    ///
    /// `rotation_hours` is the rotation interval and `max_files` the number
    /// of segments kept. An empty path removes the file sink and turns the
    /// console back on. Use `set_console(true)` afterwards to write to both.
    ///
    /// If the file cannot be opened the error is returned and the current
    /// pipeline stays in place.
    pub fn set_log_file(
        &self,
        path: impl AsRef<Path>,
        rotation_hours: u32,
        max_files: usize,
    ) -> Result<()> {
        let path = path.as_ref();
        self.rebuild(|config| {
            if path.as_os_str().is_empty() {
                config.output.file = None;
                config.output.console = true;
            } else {
                config.output.file = Some(FileConfig::new(path, rotation_hours, max_files));
                config.output.console = false;
            }
        })
    }

    /// Replace the whole configuration, including the level threshold.
    pub fn reconfigure(&self, config: LoggerConfig) -> Result<()> {
        let level = config.level;
        self.rebuild(move |current| *current = config)?;
        self.core.level.set_level(level);
        Ok(())
    }

    /// Current configuration snapshot. `level` reflects the live threshold.
    pub fn config(&self) -> LoggerConfig {
        let mut config = self.core.settings.lock().config.clone();
        config.level = self.level();
        config
    }

    /// Flush every sink of the live pipeline.
    pub fn sync(&self) -> io::Result<()> {
        self.core.pipeline.load().flush()
    }

    pub(crate) fn pipeline(&self) -> arc_swap::Guard<Arc<Pipeline>> {
        self.core.pipeline.load()
    }

    pub(crate) fn context(&self) -> &[Field] {
        &self.context
    }

    /// Rebuild without touching the file sink; cannot fail.
    fn relayout(&self, change: impl FnOnce(&mut Settings)) {
        let mut settings = self.core.settings.lock();
        change(&mut settings);
        let file = self.core.pipeline.load().file_sink().cloned();
        let pipeline = Pipeline::assemble(&settings.config, &settings.console, file);
        self.core.pipeline.store(Arc::new(pipeline));
        log_rebuilt(&settings.config);
    }

    /// Rebuild from a changed configuration, opening a new file sink if the
    /// file target changed.
    fn rebuild(&self, change: impl FnOnce(&mut LoggerConfig)) -> Result<()> {
        let mut settings = self.core.settings.lock();
        let mut config = settings.config.clone();
        change(&mut config);

        let previous = self.core.pipeline.load_full();
        let pipeline = Pipeline::build(&config, &settings.console, Some(previous.as_ref()))?;
        self.core.pipeline.store(Arc::new(pipeline));
        settings.config = config;
        log_rebuilt(&settings.config);
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("pipeline", &**self.core.pipeline.load())
            .field("context", &self.context)
            .finish()
    }
}

fn render(args: fmt::Arguments<'_>) -> Cow<'static, str> {
    match args.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(args.to_string()),
    }
}

fn log_rebuilt(config: &LoggerConfig) {
    log::debug!(
        "PIPELINE_REBUILT name={:?} console={} file={:?} caller_skip={} stacktrace={}",
        config.project_name,
        config.output.console,
        config.output.file.as_ref().map(|f| &f.path),
        config.caller_skip,
        config.stacktrace_level.as_str()
    );
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::encoding::field;
    use crate::sink::MemorySink;

    fn capture(config: LoggerConfig) -> (Logger, Arc<MemorySink>) {
        let memory = Arc::new(MemorySink::new());
        let logger = Logger::with_console_sink(config, memory.clone()).unwrap();
        (logger, memory)
    }

    fn emit_at(logger: &Logger, level: Level) {
        match level {
            Level::Debug => logger.debug("gate check"),
            Level::Info => logger.info("gate check"),
            Level::Warn => logger.warn("gate check"),
            Level::Error => logger.error("gate check"),
            Level::Panic => {
                let _ = catch_unwind(AssertUnwindSafe(|| logger.panic("gate check")));
            }
            Level::Fatal => {
                let _ = catch_unwind(AssertUnwindSafe(|| logger.fatal("gate check")));
            }
        }
    }

    #[test]
    fn test_threshold_per_level() {
        let config = LoggerConfig::default().with_fatal_action(FatalAction::Panic);
        let (logger, memory) = capture(config);

        for (i, level) in Level::ALL.iter().enumerate() {
            logger.set_log_level(level.as_str());

            emit_at(&logger, *level);
            assert_eq!(memory.take().len(), 1, "at {}", level);

            if i > 0 {
                emit_at(&logger, Level::ALL[i - 1]);
                assert!(memory.take().is_empty(), "below {}", level);
            }
        }
    }

    #[test]
    fn test_unknown_level_name_enables_debug() {
        let (logger, memory) = capture(LoggerConfig::default());
        logger.debug("hidden");
        assert!(memory.is_empty());

        logger.set_log_level("bogus");
        assert_eq!(logger.level(), Level::Debug);
        logger.debug("visible");
        assert_eq!(memory.records()[0]["M"], "visible");
    }

    #[test]
    fn test_record_fields() {
        let (logger, memory) = capture(LoggerConfig::default());
        logger.warnf(format_args!("queue depth {} over {}", 120, 100));

        let record = &memory.records()[0];
        assert_eq!(record["L"], "WARN");
        assert_eq!(record["M"], "queue depth 120 over 100");
        assert!(record["T"].is_string());
        assert!(record["C"].as_str().unwrap().starts_with("logger/mod.rs:"));
        assert!(record.get("N").is_none());
    }

    #[test]
    fn test_project_name_applies_to_later_records() {
        let (logger, memory) = capture(LoggerConfig::default());
        logger.info("before");
        logger.set_project_name("billing");
        logger.info("after");
        logger.error("again");

        let records = memory.records();
        assert!(records[0].get("N").is_none());
        assert_eq!(records[1]["N"], "billing");
        assert_eq!(records[2]["N"], "billing");
    }

    #[test]
    fn test_empty_project_name_keeps_current() {
        let (logger, memory) = capture(LoggerConfig::default());
        logger.set_project_name("billing");
        logger.set_project_name("");
        logger.info("still named");

        assert_eq!(memory.records()[0]["N"], "billing");
        assert_eq!(logger.config().project_name.as_deref(), Some("billing"));
    }

    #[test]
    fn test_fatal_runs_action_when_flush_fails() {
        struct Unflushable(MemorySink);

        impl Sink for Unflushable {
            fn write_line(&self, line: &[u8]) -> io::Result<()> {
                self.0.write_line(line)
            }

            fn flush(&self) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Other, "device gone"))
            }
        }

        let sink = Arc::new(Unflushable(MemorySink::new()));
        let config = LoggerConfig::default().with_fatal_action(FatalAction::Panic);
        let logger = Logger::with_console_sink(config, sink.clone()).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| logger.fatal("shutting down")));
        assert!(result.is_err());
        assert_eq!(sink.0.records()[0]["L"], "FATAL");
    }

    #[test]
    fn test_fields_and_child_context() {
        let (logger, memory) = capture(LoggerConfig::default());
        let child = logger.with([field("request_id", "r-17")]);

        child.infow("charged", &[field("amount_cents", 1250)]);
        logger.info("parent");

        let records = memory.records();
        assert_eq!(records[0]["request_id"], "r-17");
        assert_eq!(records[0]["amount_cents"], json!(1250));
        assert!(records[1].get("request_id").is_none());

        // Children share the level gate.
        child.set_log_level("error");
        assert_eq!(logger.level(), Level::Error);
    }

    #[test]
    fn test_panic_writes_one_record_then_unwinds() {
        let (logger, memory) = capture(LoggerConfig::default());

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panicf(format_args!("invariant broken: {}", "slot 3"))
        }));

        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<String>().map(String::as_str),
            Some("invariant broken: slot 3")
        );
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["L"], "PANIC");
        assert!(records[0]["S"].is_string());

        // The logger keeps working after the panic was caught.
        logger.info("still alive");
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_fatal_runs_configured_action() {
        let config = LoggerConfig::default().with_fatal_action(FatalAction::Panic);
        let (logger, memory) = capture(config);

        let result = catch_unwind(AssertUnwindSafe(|| logger.fatal("disk full")));
        assert!(result.is_err());
        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["L"], "FATAL");
        assert_eq!(records[0]["M"], "disk full");
    }

    #[test]
    fn test_panic_below_threshold_still_panics() {
        let (logger, memory) = capture(LoggerConfig::default().with_level(Level::Fatal));
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("quiet")));
        assert!(result.is_err());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_structural_setters_idempotent() {
        let (logger, memory) = capture(LoggerConfig::default());

        logger.set_stacktrace_level("error");
        logger.set_caller_skip(0);
        let first = logger.config();
        logger.error("one");

        logger.set_stacktrace_level("error");
        logger.set_caller_skip(0);
        assert_eq!(logger.config(), first);
        logger.error("two");

        let records = memory.records();
        let keys = |i: usize| records[i].as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(0), keys(1));
        assert!(records[1]["S"].is_string());
    }

    #[test]
    fn test_failed_log_file_keeps_previous_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let (logger, memory) = capture(LoggerConfig::default());

        let err = logger.set_log_file(blocker.join("app.log"), 24, 7);
        assert!(err.is_err());
        assert!(logger.config().output.file.is_none());

        logger.info("still on console");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_log_file_replaces_console_until_cleared() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let (logger, memory) = capture(LoggerConfig::default());

        logger.set_log_file(dir.path().join("svc.log"), 24, 7)?;
        logger.info("to file");
        assert!(memory.is_empty());

        logger.set_console(true);
        logger.info("to both");
        assert_eq!(memory.len(), 1);

        logger.set_log_file("", 0, 0)?;
        assert!(logger.config().output.file.is_none());
        logger.info("back on console");
        assert_eq!(memory.len(), 2);
        Ok(())
    }

    #[test]
    fn test_reconfigure_sets_threshold() -> anyhow::Result<()> {
        let (logger, memory) = capture(LoggerConfig::default());
        logger.reconfigure(LoggerConfig::default().with_level(Level::Debug).with_project_name("ops"))?;

        logger.debug("now visible");
        assert_eq!(memory.records()[0]["N"], "ops");
        assert_eq!(logger.config().level, Level::Debug);
        Ok(())
    }

    #[test]
    fn test_concurrent_logging_during_reconfiguration() {
        let (logger, memory) = capture(LoggerConfig::default());
        let threads = 4;
        let per_thread = 200;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for i in 0..per_thread {
                        logger.infof(format_args!("worker {} record {}", t, i));
                    }
                })
            })
            .collect();

        for i in 0..50 {
            logger.set_project_name(if i % 2 == 0 { "even" } else { "odd" });
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(memory.len(), threads * per_thread);
        assert!(memory.records().iter().all(|r| r["L"] == "INFO"));
    }
}
