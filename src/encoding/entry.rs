//! Record model handed to encoders.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

/// Source location a record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller<'a> {
    pub file: Cow<'a, str>,
    pub line: u32,
}

impl<'a> Caller<'a> {
    pub fn new(file: impl Into<Cow<'a, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// `dir/file.rs:line`, keeping only the last two path components.
    pub fn short(&self) -> String {
        let file = self.file.replace('\\', "/");
        let mut parts = file.rsplitn(3, '/');
        let name = parts.next().unwrap_or_default();
        match parts.next() {
            Some(dir) if !dir.is_empty() => format!("{}/{}:{}", dir, name, self.line),
            _ => format!("{}:{}", name, self.line),
        }
    }
}

impl From<&'static Location<'static>> for Caller<'static> {
    fn from(location: &'static Location<'static>) -> Self {
        Caller::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A typed key/value pair attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)));
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Shorthand for [`Field::new`].
pub fn field(key: impl Into<Cow<'static, str>>, value: impl Serialize) -> Field {
    Field::new(key, value)
}

/// One log record, borrowed from the emitting call.
#[derive(Debug)]
pub struct Entry<'a> {
    pub time: DateTime<Local>,
    pub level: Level,
    pub name: Option<&'a str>,
    pub caller: Option<Caller<'a>>,
    pub message: &'a str,
    /// Fields bound to the logger via `Logger::with`.
    pub context: &'a [Field],
    /// Fields passed to this call.
    pub fields: &'a [Field],
    pub stack: Option<String>,
}
