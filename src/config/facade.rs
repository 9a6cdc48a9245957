//! ConfigLoader facade over the `config` crate.

use super::{xdg, RegistryConfig};
use crate::error::ApiError;
use config::{Config, ConfigError, Environment, File, FileFormat};
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    ///
    /// Precedence: defaults (lowest) -> explicit file, or the XDG config file
    /// when present -> `IDREG__` environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<RegistryConfig, ConfigError> {
        let mut builder = Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Ok(default_path) = xdg::default_config_path() {
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let builder = builder.add_source(
            Environment::with_prefix("IDREG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Parse configuration from a TOML string, without any overlay.
    pub fn from_toml(content: &str) -> Result<RegistryConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Render the effective configuration as TOML.
    pub fn render(config: &RegistryConfig) -> Result<String, ApiError> {
        toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogOutput};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_from_toml_sections() {
        let config = ConfigLoader::from_toml(
            r#"
            [storage]
            path = "/var/lib/registry.sled"

            [logging]
            level = "debug"
            output = "stderr"
            format = "text"

            [balances]
            "0x0000000000000000000000000000000000000001" = 500
            "#,
        )
        .unwrap();
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/var/lib/registry.sled"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.output, LogOutput::Stderr);
        assert_eq!(config.balances.len(), 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ConfigLoader::from_toml("").unwrap();
        assert!(config.storage.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.balances.is_empty());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[logging]\nformat = \"json\"\n").unwrap();
        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_render_parses_back() {
        let mut config = RegistryConfig::default();
        config.storage.path = Some(PathBuf::from("/srv/registry.sled"));
        config.logging.level = "warn".to_string();
        let rendered = ConfigLoader::render(&config).unwrap();
        let parsed = ConfigLoader::from_toml(&rendered).unwrap();
        assert_eq!(parsed.storage.path, config.storage.path);
        assert_eq!(parsed.logging.level, "warn");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        assert!(ConfigLoader::load(Some(&path)).is_err());
    }
}
