use super::types::*;
use crate::error_handling::types::ConfigError;
use log::{debug, info};
use std::path::Path;

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub runtime: Option<String>,
    pub image: Option<String>,
    pub network: Option<String>,
    pub keep_running: bool,
}

impl Config {
    /// Reads a TOML configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid TOML, contains unknown
    /// keys, or does not pass [`Config::validate`].
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Builds the effective configuration: file (if any), then overrides.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(p) => Config::from_file(p)?,
            None => Config::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(runtime) = overrides.runtime {
            self.runtime = runtime;
        }
        if let Some(image) = overrides.image {
            self.image = image;
        }
        if let Some(network) = overrides.network {
            self.network = network;
        }
        if overrides.keep_running {
            self.stop_on_exit = false;
        }
    }

    /// Checks that every value can be passed as a single runtime argument.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("runtime", &self.runtime),
            ("container_name", &self.container_name),
            ("image", &self.image),
            ("network", &self.network),
            ("tmpfs", &self.tmpfs),
            ("mode_env_var", &self.mode_env_var),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name.to_string()));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must not contain whitespace: {:?}",
                    name, value
                )));
            }
        }

        if !self.tmpfs.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "tmpfs must be an absolute path: {:?}",
                self.tmpfs
            )));
        }

        if self.mode_env_var.contains('=') {
            return Err(ConfigError::InvalidValue(format!(
                "mode_env_var must not contain '=': {:?}",
                self.mode_env_var
            )));
        }

        Ok(())
    }
}
