use serde::{Deserialize, Serialize};

pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_CONTAINER_NAME: &str = "sandbox-browser";
pub const DEFAULT_IMAGE: &str = "browser";
pub const DEFAULT_NETWORK: &str = "sandbox-net";
pub const DEFAULT_TMPFS: &str = "/tmp";
pub const DEFAULT_MODE_ENV_VAR: &str = "SANDBOX_MODE";

/// Application configuration.
///
/// # Fields Overview
///
/// - `runtime`: container runtime CLI binary invoked for every operation
/// - `container_name`: the single container slot managed by the controller
/// - `image`: image launched into that slot
/// - `network`: network the container is attached to
/// - `tmpfs`: writable temp mount on top of the read-only root
/// - `mode_env_var`: variable carrying the preset name into the container
/// - `stop_on_exit`: stop the container when the controller shuts down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runtime: String,
    pub container_name: String,
    pub image: String,
    pub network: String,
    pub tmpfs: String,
    pub mode_env_var: String,
    pub stop_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            network: DEFAULT_NETWORK.to_string(),
            tmpfs: DEFAULT_TMPFS.to_string(),
            mode_env_var: DEFAULT_MODE_ENV_VAR.to_string(),
            stop_on_exit: true,
        }
    }
}
