use crate::models::EditorConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::fs;

/// Name of the editor configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "Destiny Query.yaml";

/// Prefix of environment overrides, e.g. `DESTINY_QUERY__DATASOURCE__RESOURCE_BASE_URL`
pub const ENV_PREFIX: &str = "DESTINY_QUERY";

/// Configuration manager for loading and saving the editor's YAML configuration.
///
/// Values are layered: built-in defaults, then `Destiny Query.yaml`, then environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the editor configuration.
    ///
    /// # Returns
    /// The layered configuration; defaults fill anything neither the file nor the environment set
    pub fn load_config(&self) -> Result<EditorConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let layered = Config::builder()
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: EditorConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!(
            "Loaded config from {} (resources at {})",
            self.config_path,
            config.datasource.resource_base_url
        );
        Ok(config)
    }

    /// Save the editor configuration file.
    pub fn save_config(&self, config: &EditorConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_config_path_inside_dir() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert_eq!(manager.config_path().parent(), Some(manager.config_dir()));
        assert_eq!(manager.config_path().file_name(), Some(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_save_then_load_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut config = EditorConfig::default();
        config.datasource.request_timeout_secs = 12;
        config.logging.console_output = true;
        manager.save_config(&config).unwrap();

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.datasource.request_timeout_secs, 12);
        assert!(loaded.logging.console_output);
    }
}
