//! Maps presets to launch specifications and builds the runtime argument
//! vectors for every lifecycle operation. Nothing here performs I/O.

use crate::configuration::Config;
use crate::container_management::types::{LaunchSpec, Preset};

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    config: Config,
}

impl CommandBuilder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn container_name(&self) -> &str {
        &self.config.container_name
    }

    /// Builds the launch specification for `preset`.
    ///
    /// Without a preset the container starts with no resource limits and no
    /// mode tag; network and filesystem policy are identical for every mode.
    pub fn build_launch_spec(&self, preset: Option<Preset>) -> LaunchSpec {
        let env = match preset {
            Some(p) => vec![(self.config.mode_env_var.clone(), p.as_str().to_string())],
            None => Vec::new(),
        };

        LaunchSpec {
            container_name: self.config.container_name.clone(),
            image: self.config.image.clone(),
            detached: true,
            auto_remove: true,
            resources: preset.map(|p| p.resources()),
            env,
            network: self.config.network.clone(),
            read_only_root: true,
            tmpfs: self.config.tmpfs.clone(),
        }
    }

    /// Same as [`build_launch_spec`](Self::build_launch_spec) for a raw preset
    /// name; unrecognized names behave like no preset.
    pub fn build_for_name(&self, name: Option<&str>) -> LaunchSpec {
        self.build_launch_spec(name.and_then(Preset::parse))
    }

    pub fn stop_args(&self) -> Vec<String> {
        vec!["stop".to_string(), self.config.container_name.clone()]
    }

    pub fn follow_logs_args(&self) -> Vec<String> {
        vec![
            "logs".to_string(),
            "-f".to_string(),
            self.config.container_name.clone(),
        ]
    }

    pub fn inspect_state_args(&self) -> Vec<String> {
        vec![
            "inspect".to_string(),
            "--format".to_string(),
            "{{.State.Status}}".to_string(),
            self.config.container_name.clone(),
        ]
    }
}
