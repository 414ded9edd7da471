//! Encoder key configuration.

use serde::{Deserialize, Serialize};

/// Keys used for the fixed fields of every record.
///
/// An empty key omits that field from the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub time_key: String,
    pub name_key: String,
    pub level_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
}

impl EncoderConfig {
    /// Whether `key` is one of the enabled fixed keys.
    pub fn is_reserved(&self, key: &str) -> bool {
        !key.is_empty()
            && [
                &self.time_key,
                &self.name_key,
                &self.level_key,
                &self.caller_key,
                &self.message_key,
                &self.stacktrace_key,
            ]
            .iter()
            .any(|reserved| reserved.as_str() == key)
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "T".to_string(),
            name_key: "N".to_string(),
            level_key: "L".to_string(),
            caller_key: "C".to_string(),
            message_key: "M".to_string(),
            stacktrace_key: "S".to_string(),
            line_ending: "\n".to_string(),
        }
    }
}
