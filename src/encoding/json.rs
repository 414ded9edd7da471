//! Line-delimited JSON encoder.

use serde_json::{Map, Value};

use super::config::EncoderConfig;
use super::entry::Entry;

/// ISO-8601 local time with milliseconds and numeric offset.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Encodes entries as one JSON object per line.
///
/// Key order is level, time, name, caller, message, context fields, call
/// fields, stack trace. A field named like one of the configured fixed keys
/// is written as `_<key>`; a field repeating another field's key replaces
/// that value in place.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, entry: &Entry<'_>) -> Vec<u8> {
        let cfg = &self.config;
        let mut object = Map::new();

        put(&mut object, &cfg.level_key, || entry.level.as_capital_str().into());
        put(&mut object, &cfg.time_key, || {
            entry.time.format(TIME_FORMAT).to_string().into()
        });
        if let Some(name) = entry.name {
            put(&mut object, &cfg.name_key, || name.into());
        }
        if let Some(caller) = &entry.caller {
            put(&mut object, &cfg.caller_key, || caller.short().into());
        }
        put(&mut object, &cfg.message_key, || entry.message.into());

        for field in entry.context.iter().chain(entry.fields) {
            let key = field.key();
            let key = if cfg.is_reserved(key) {
                format!("_{}", key)
            } else {
                key.to_string()
            };
            object.insert(key, field.value().clone());
        }

        if let Some(stack) = &entry.stack {
            put(&mut object, &cfg.stacktrace_key, || stack.as_str().into());
        }

        let mut line = Value::Object(object).to_string().into_bytes();
        line.extend_from_slice(cfg.line_ending.as_bytes());
        line
    }
}

fn put(object: &mut Map<String, Value>, key: &str, value: impl FnOnce() -> Value) {
    if !key.is_empty() {
        object.insert(key.to_string(), value());
    }
}
