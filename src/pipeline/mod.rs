//! Record pipeline.
//!
//! ```text
//! LoggerConfig (snapshot)
//!     → builder.rs (open/reuse sinks, bind encoder, caller skip, stack threshold)
//!     → Pipeline (immutable, swapped atomically by Logger)
//!
//! On each record:
//!     caller.rs resolves the call site (and the stack trace above threshold)
//!     → encoder → sink
//! ```

pub mod builder;
pub(crate) mod caller;
pub mod config;

pub use builder::*;
pub use config::*;
