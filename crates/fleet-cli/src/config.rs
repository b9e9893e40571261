use std::fs;
use std::path::{Path, PathBuf};

use fleet_core::{DEFAULT_REGISTRATIONS, config_directory};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5001";

/// Settings persisted in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub backend_url: String,
    pub default_registrations: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            default_registrations: DEFAULT_REGISTRATIONS
                .iter()
                .map(|registration| registration.to_string())
                .collect(),
        }
    }
}

impl CliConfig {
    pub fn default_registrations(&self) -> Vec<&str> {
        self.default_registrations
            .iter()
            .map(String::as_str)
            .collect()
    }
}

/// Outcome of [`load_config`]; problems reading the file become warnings.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: CliConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    File,
}

pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load `path`, falling back to defaults when it is missing or unusable.
pub fn load_config(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<CliConfig>(&raw) {
                Ok(config) => {
                    return ConfigLoadResult {
                        config,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse {} as TOML: {}. Falling back to defaults.",
                    path.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read {}: {}. Falling back to defaults.",
                path.display(),
                err
            )),
        }
    }

    ConfigLoadResult {
        config: CliConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults_quietly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config(&dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
        assert_eq!(result.config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(
            result.config.default_registrations(),
            vec!["DF04BEY", "D1PLO", "MK63XAR"]
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "backend_url = \"http://fleet.local:8080\"\n").expect("write");

        let result = load_config(&path);
        assert_eq!(result.source, ConfigSource::File);
        assert_eq!(result.config.backend_url, "http://fleet.local:8080");
        assert_eq!(result.config.default_registrations.len(), 3);
    }

    #[test]
    fn malformed_file_warns_and_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "default_registrations = 12").expect("write");

        let result = load_config(&path);
        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Falling back to defaults"));
    }
}
