use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for a tracker instance.
///
/// ```toml
/// settle_delay_ms = 500
/// debounce_ms = 50
/// event_capacity = 256
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Wait after `.git` shows up before enabling, so the tool creating the
    /// repository can finish writing its skeleton.
    pub settle_delay_ms: u64,
    /// Debounce window for the `logs/HEAD` and `refs` watches.
    pub debounce_ms: u64,
    /// Capacity of the broadcast channel that carries tracker events.
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            debounce_ms: 50,
            event_capacity: 256,
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();

        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TrackerConfig::from_toml_str("settle_delay_ms = 1000").unwrap();

        assert_eq!(config.settle_delay_ms, 1000);
        assert_eq!(config.debounce_ms, 50);
    }

    #[test]
    fn test_invalid_toml() {
        let result = TrackerConfig::from_toml_str("settle_delay_ms = \"soon\"");

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gittrack.toml");
        std::fs::write(&path, "debounce_ms = 10\nevent_capacity = 8\n").unwrap();

        let config = TrackerConfig::load(&path).unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(10));
        assert_eq!(config.event_capacity, 8);
        assert!(matches!(
            TrackerConfig::load(temp_dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = TrackerConfig::default()
            .with_settle_delay(Duration::from_millis(20))
            .with_debounce(Duration::from_millis(5));

        assert_eq!(config.settle_delay_ms, 20);
        assert_eq!(config.debounce_ms, 5);
    }
}
