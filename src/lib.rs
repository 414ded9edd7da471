//! zlog - structured JSON logging facade
//!
//! Leveled logging (debug/info/warn/error/panic/fatal, each with a formatted
//! and a key/value variant) on top of a small pipeline: a lock-free level
//! gate, a fixed-key JSON encoder and console and/or rotating file sinks.
//! The pipeline can be reconfigured at runtime while other threads log.
//!
//! ## Architecture
//!
//! - `level` - severities, lossy name mapping, the atomic level gate
//! - `encoding` - record model and the JSON line encoder (`T,N,L,C,M,S` keys)
//! - `sink` - console, rolling file, memory and fan-out sinks
//! - `pipeline` - configuration snapshot and the immutable pipeline built from it
//! - `logger` - the `Logger` handle, setters, `log` crate bridge
//! - `facade` - process-wide logger and the `*f!` macros
//!
//! ## Example
//!
//! ```no_run
//! use zlog::{field, Logger, LoggerConfig};
//!
//! let logger = Logger::from_config(LoggerConfig::default().with_project_name("billing"))?;
//! logger.set_log_file("logs/billing.log", 24, 7)?;
//!
//! logger.info("service started");
//! logger.infof(format_args!("listening on {}", 8080));
//! logger.warnw("retrying charge", &[field("attempt", 2)]);
//! logger.sync()?;
//!
//! // Or the process-wide instance:
//! zlog::set_log_level("debug");
//! zlog::infof!("cache warmed in {}ms", 42);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod encoding;
pub mod error;
pub mod facade;
pub mod level;
pub mod logger;
pub mod pipeline;
pub mod sink;

pub use encoding::{field, Caller, EncoderConfig, Entry, Field, JsonEncoder};
pub use error::{Error, Result};
pub use facade::*;
pub use level::{AtomicLevel, Level};
pub use logger::Logger;
pub use pipeline::{FatalAction, FileConfig, LoggerConfig, OutputConfig, Pipeline};
pub use sink::{ConsoleSink, FanOut, MemorySink, RollingFileSink, Sink};
