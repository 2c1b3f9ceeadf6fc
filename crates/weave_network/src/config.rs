//! Overlay configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one overlay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// IP address every synthetic peer listens on (ports vary).
    pub address_prefix: String,

    /// Port of the first peer; peer `i` listens on `start_port + i`.
    pub start_port: u16,

    /// Number of peers (and topology nodes) to create.
    pub node_count: usize,

    /// Probability that any unordered node pair gets a hyperedge.
    pub edge_probability: f64,

    /// Seed for the topology RNG; a fixed seed reproduces the same wiring
    /// for a given node count.
    pub topology_seed: u64,

    /// Bounded wait for the measured flood to reach every peer.
    #[serde(with = "duration_serde")]
    pub delivery_timeout: Duration,

    /// Maximum distinct message keys a peer's delivery log retains before
    /// the oldest key is evicted.
    pub message_log_capacity: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            address_prefix: "127.0.0.1".to_string(),
            start_port: 9600,
            node_count: 5,
            edge_probability: 0.5,
            topology_seed: 7,
            delivery_timeout: Duration::from_secs(5),
            message_log_capacity: 256,
        }
    }
}

impl OverlayConfig {
    /// Save the config to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory: {e}"))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Load config from a JSON file, or return defaults if the file is
    /// missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<OverlayConfig>(&data) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Corrupt config file, using defaults: {e}");
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read config file, using defaults: {e}");
                }
            }
        }
        Self::default()
    }

    /// The listen address of peer `index`.
    pub fn peer_address(&self, index: usize) -> String {
        format!("{}:{}", self.address_prefix, self.start_port as usize + index)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(dur: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(dur.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::default();
        assert_eq!(config.address_prefix, "127.0.0.1");
        assert_eq!(config.start_port, 9600);
        assert_eq!(config.node_count, 5);
        assert_eq!(config.edge_probability, 0.5);
        assert_eq!(config.delivery_timeout, Duration::from_secs(5));
        assert_eq!(config.message_log_capacity, 256);
    }

    #[test]
    fn test_peer_address() {
        let config = OverlayConfig::default();
        assert_eq!(config.peer_address(0), "127.0.0.1:9600");
        assert_eq!(config.peer_address(3), "127.0.0.1:9603");
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = OverlayConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: OverlayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.start_port, config.start_port);
        assert_eq!(deserialized.node_count, config.node_count);
        assert_eq!(deserialized.delivery_timeout, config.delivery_timeout);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");

        let mut original = OverlayConfig::default();
        original.node_count = 9;
        original.topology_seed = 42;
        original.save_to_file(&path).unwrap();

        let loaded = OverlayConfig::load_or_default(&path);
        assert_eq!(loaded.node_count, 9);
        assert_eq!(loaded.topology_seed, 42);
    }

    #[test]
    fn test_config_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = OverlayConfig::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(config.node_count, 5);
    }

    #[test]
    fn test_config_load_corrupt_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = OverlayConfig::load_or_default(&path);
        assert_eq!(config.start_port, 9600);
    }
}
