//! Daemon configuration.
//!
//! Loaded from /etc/cue/config.toml (override with $CUE_CONFIG). A missing
//! file means defaults; a broken file is logged and also means defaults,
//! the daemon never refuses to start over configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::matcher::MatchConfig;
use crate::remote::RemoteConfig;

/// Default config file path.
pub const CONFIG_PATH: &str = "/etc/cue/config.toml";

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "CUE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default, rename = "match")]
    pub matching: MatchConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

impl DaemonConfig {
    /// Load from the default or overridden path.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    info!("loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let config = DaemonConfig::load_from(Path::new("/nonexistent/cue.toml"));
        assert_eq!(config.matching.fitness_threshold, 6);
        assert_eq!(config.matching.short_key_length, 20);
        assert!(!config.matching.force_remote);
    }

    #[test]
    fn parses_partial_toml() {
        let raw = r#"
            [match]
            fitness_threshold = 3

            [remote]
            model = "gpt-4o"
            api_key = "sk-test"
        "#;
        let config: DaemonConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.matching.fitness_threshold, 3);
        assert_eq!(config.matching.short_key_length, 20);
        assert_eq!(config.remote.model, "gpt-4o");
        assert_eq!(config.remote.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.remote.endpoint, "https://api.openai.com");
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.matching.fitness_threshold, 6);
    }
}
