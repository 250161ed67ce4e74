use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    EmptyField(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::EmptyField(e) => write!(f, "Empty configuration field: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

/// Failures reported by a container runtime adapter.
#[derive(Debug)]
pub enum AdapterError {
    /// The runtime binary could not be spawned at all.
    RuntimeNotAvailable(String),
    /// The runtime ran and exited non-zero; carries its diagnostic text.
    CommandFailed(String),
    IoError(std::io::Error),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::RuntimeNotAvailable(e) => write!(f, "Container runtime not available: {}", e),
            AdapterError::CommandFailed(e) => write!(f, "Runtime command failed: {}", e),
            AdapterError::IoError(e) => write!(f, "Runtime IO error: {}", e),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::IoError(err)
    }
}

#[derive(Debug)]
pub enum ContainerError {
    RuntimeNotAvailable(String),
    LaunchFailed(String),
    StreamFailed(String),
    QueryFailed(String),
    IoError(std::io::Error),
}

impl ContainerError {
    /// Raw diagnostic text as produced by the runtime, suitable for a log panel.
    pub fn diagnostic(&self) -> String {
        match self {
            ContainerError::RuntimeNotAvailable(e)
            | ContainerError::LaunchFailed(e)
            | ContainerError::StreamFailed(e)
            | ContainerError::QueryFailed(e) => e.clone(),
            ContainerError::IoError(e) => e.to_string(),
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::RuntimeNotAvailable(e) => {
                write!(f, "Container runtime not available: {}", e)
            }
            ContainerError::LaunchFailed(e) => write!(f, "Container launch failed: {}", e),
            ContainerError::StreamFailed(e) => write!(f, "Container log stream failed: {}", e),
            ContainerError::QueryFailed(e) => write!(f, "Container state query failed: {}", e),
            ContainerError::IoError(e) => write!(f, "Container IO error: {}", e),
        }
    }
}

impl std::error::Error for ContainerError {}

impl From<std::io::Error> for ContainerError {
    fn from(err: std::io::Error) -> Self {
        ContainerError::IoError(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    ContainerError(ContainerError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::ContainerError(e) => write!(f, "Container error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<ContainerError> for ControllerError {
    fn from(err: ContainerError) -> Self {
        ControllerError::ContainerError(err)
    }
}
