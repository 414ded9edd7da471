//! Process-wide logger.
//!
//! Free functions that forward to one lazily created `Logger`, for code that
//! does not carry a handle around. The instance starts with the default
//! configuration (info, stdout) and is reconfigured through the setters here.
//! Applications that inject a `Logger` explicitly don't need this module.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::encoding::Field;
use crate::error::Result;
use crate::logger::Logger;
use crate::pipeline::{FatalAction, LoggerConfig};
use crate::sink::Sink;

lazy_static! {
    static ref GLOBAL: Logger = Logger::new();
}

/// The process-wide logger.
pub fn global() -> &'static Logger {
    &GLOBAL
}

macro_rules! forward {
    ($($name:ident),* $(,)?) => {
        $(
            #[track_caller]
            pub fn $name(msg: impl fmt::Display) {
                GLOBAL.$name(msg)
            }
        )*
    };
}

macro_rules! forward_formatted {
    ($($name:ident),* $(,)?) => {
        $(
            #[track_caller]
            pub fn $name(args: fmt::Arguments<'_>) {
                GLOBAL.$name(args)
            }
        )*
    };
}

macro_rules! forward_fields {
    ($($name:ident),* $(,)?) => {
        $(
            #[track_caller]
            pub fn $name(msg: impl fmt::Display, fields: &[Field]) {
                GLOBAL.$name(msg, fields)
            }
        )*
    };
}

forward!(debug, info, warn, error);
forward_formatted!(debugf, infof, warnf, errorf);
forward_fields!(debugw, infow, warnw, errorw);

/// Log at panic level, then panic.
#[track_caller]
pub fn panic(msg: impl fmt::Display) -> ! {
    GLOBAL.panic(msg)
}

#[track_caller]
pub fn panicf(args: fmt::Arguments<'_>) -> ! {
    GLOBAL.panicf(args)
}

/// Log at fatal level, flush, then run the fatal action (exit by default).
#[track_caller]
pub fn fatal(msg: impl fmt::Display) -> ! {
    GLOBAL.fatal(msg)
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) -> ! {
    GLOBAL.fatalf(args)
}

pub fn set_log_level(level: &str) {
    GLOBAL.set_log_level(level)
}

pub fn set_project_name(name: &str) {
    GLOBAL.set_project_name(name)
}

pub fn set_stacktrace_level(level: &str) {
    GLOBAL.set_stacktrace_level(level)
}

pub fn set_caller_skip(skip: usize) {
    GLOBAL.set_caller_skip(skip)
}

pub fn set_log_file(path: impl AsRef<Path>, rotation_hours: u32, max_files: usize) -> Result<()> {
    GLOBAL.set_log_file(path, rotation_hours, max_files)
}

pub fn set_console(enabled: bool) {
    GLOBAL.set_console(enabled)
}

pub fn set_console_sink(sink: Arc<dyn Sink>) {
    GLOBAL.set_console_sink(sink)
}

pub fn set_fatal_action(action: FatalAction) {
    GLOBAL.set_fatal_action(action)
}

pub fn reconfigure(config: LoggerConfig) -> Result<()> {
    GLOBAL.reconfigure(config)
}

/// Flush the process-wide logger. Call before shutdown.
pub fn sync() -> io::Result<()> {
    GLOBAL.sync()
}

/// Route the `log` crate through the process-wide logger.
pub fn install() -> Result<()> {
    GLOBAL.install()
}

/// `debugf!("...", args)` on the process-wide logger.
#[macro_export]
macro_rules! debugf {
    ($($arg:tt)+) => {
        $crate::global().debugf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! infof {
    ($($arg:tt)+) => {
        $crate::global().infof(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! warnf {
    ($($arg:tt)+) => {
        $crate::global().warnf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! errorf {
    ($($arg:tt)+) => {
        $crate::global().errorf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! panicf {
    ($($arg:tt)+) => {
        $crate::global().panicf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! fatalf {
    ($($arg:tt)+) => {
        $crate::global().fatalf(::std::format_args!($($arg)+))
    };
}
