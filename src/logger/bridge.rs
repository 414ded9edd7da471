//! `log` crate backend.
//!
//! Installing a `Logger` as the process-wide `log` backend routes
//! `log::info!` and friends through the same gate, encoder and sinks. The
//! record's file and line become the caller, and its target is added as a
//! `target` field unless it equals the project name. Records targeted at
//! this crate are not fed back in.

use chrono::Local;

use super::Logger;
use crate::encoding::{Caller, Entry, Field};
use crate::error::Result;
use crate::level::Level;

impl Logger {
    /// Register a clone of this logger as the `log` backend.
    ///
    /// The `log` max level is opened fully; filtering happens in this
    /// logger's gate so `set_log_level` keeps working.
    pub fn install(&self) -> Result<()> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }
}

fn is_own_target(target: &str) -> bool {
    let crate_name = env!("CARGO_CRATE_NAME");
    target == crate_name
        || target
            .strip_prefix(crate_name)
            .map_or(false, |rest| rest.starts_with("::"))
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        !is_own_target(metadata.target()) && self.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        let caller = match (record.file(), record.line()) {
            (Some(file), Some(line)) => Some(Caller::new(file, line)),
            _ => None,
        };
        let pipeline = self.pipeline();
        let target = record.target();
        let target_field = [Field::new("target", target)];
        let fields = if target.is_empty() || pipeline.name() == Some(target) {
            &target_field[..0]
        } else {
            &target_field[..]
        };

        pipeline.write(Entry {
            time: Local::now(),
            level: Level::from(record.level()),
            name: None,
            caller,
            message: &message,
            context: self.context(),
            fields,
            stack: None,
        });
    }

    fn flush(&self) {
        let _ = self.sync();
    }
}
