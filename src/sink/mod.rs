//! Output sinks.
//!
//! A sink receives fully encoded records, one line per call, and is
//! responsible for serializing its own writes:
//! - `ConsoleSink` - stdout/stderr
//! - `RollingFileSink` - time-rotated file with a retention count
//! - `MemorySink` - in-process buffer, mostly for tests
//! - `FanOut` - duplicates every record to several sinks

pub mod console;
pub mod memory;
pub mod rolling;

pub use console::*;
pub use memory::*;
pub use rolling::*;

use std::io;
use std::sync::Arc;

/// Destination for encoded records.
pub trait Sink: Send + Sync {
    /// Write one encoded record, line ending included.
    fn write_line(&self, line: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes every record to each child sink in order.
///
/// A failing child does not stop delivery to the rest; the first error is
/// returned after all children were tried.
pub struct FanOut {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanOut {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&self, op: impl Fn(&dyn Sink) -> io::Result<()>) -> io::Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = op(sink.as_ref()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Sink for FanOut {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        self.each(|sink| sink.write_line(line))
    }

    fn flush(&self) -> io::Result<()> {
        self.each(|sink| sink.flush())
    }
}
