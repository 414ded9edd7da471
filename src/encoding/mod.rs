//! Record encoding.
//!
//! Records are serialized as single-line JSON objects with short fixed keys:
//! `T` time, `N` logger name, `L` level, `C` caller, `M` message, `S` stack trace.

pub mod config;
pub mod entry;
pub mod json;

pub use config::*;
pub use entry::*;
pub use json::*;
