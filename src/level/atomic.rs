//! Lock-free level gate.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::Level;

/// A shared, atomically updated minimum level.
///
/// Clones observe the same threshold. Records below the threshold are dropped
/// before any formatting happens.
#[derive(Debug, Clone)]
pub struct AtomicLevel(Arc<AtomicU8>);

impl AtomicLevel {
    pub fn new(level: Level) -> Self {
        Self(Arc::new(AtomicU8::new(level as u8)))
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    /// Whether a record at `level` passes the gate.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Level::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_threshold() {
        let gate = AtomicLevel::new(Level::Info);
        let other = gate.clone();

        other.set_level(Level::Error);
        assert_eq!(gate.level(), Level::Error);
        assert!(!gate.enabled(Level::Warn));
        assert!(gate.enabled(Level::Error));
        assert!(gate.enabled(Level::Fatal));
    }

    #[test]
    fn test_default_is_info() {
        let gate = AtomicLevel::default();
        assert!(!gate.enabled(Level::Debug));
        assert!(gate.enabled(Level::Info));
    }
}
