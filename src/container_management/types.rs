//! Core types used by the container management subsystem.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Named resource/environment profile selectable before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Safe,
    Malware,
    Full,
    Proxy,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Safe, Preset::Malware, Preset::Full, Preset::Proxy];

    /// Parses a preset name. Unknown names map to `None`, the same as no preset.
    pub fn parse(name: &str) -> Option<Preset> {
        match name {
            "safe" => Some(Preset::Safe),
            "malware" => Some(Preset::Malware),
            "full" => Some(Preset::Full),
            "proxy" => Some(Preset::Proxy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Safe => "safe",
            Preset::Malware => "malware",
            Preset::Full => "full",
            Preset::Proxy => "proxy",
        }
    }

    /// CPU share and memory limit, as passed to `--cpus` and `--memory`.
    pub fn resources(&self) -> ResourceLimits {
        let (cpus, memory) = match self {
            Preset::Safe => ("1", "1g"),
            Preset::Malware => ("2", "2g"),
            Preset::Full => ("3", "3g"),
            Preset::Proxy => ("1.5", "1.5g"),
        };
        ResourceLimits { cpus, memory }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpus: &'static str,
    pub memory: &'static str,
}

/// Fully resolved parameters needed to launch the sandbox container.
///
/// Built fresh for every start request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub container_name: String,
    pub image: String,
    pub detached: bool,
    pub auto_remove: bool,
    pub resources: Option<ResourceLimits>,
    pub env: Vec<(String, String)>,
    pub network: String,
    pub read_only_root: bool,
    pub tmpfs: String,
}

impl LaunchSpec {
    /// Renders the launch as discrete runtime arguments, starting with `run`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string()];
        if self.detached {
            args.push("-d".to_string());
        }
        if self.auto_remove {
            args.push("--rm".to_string());
        }
        args.push("--name".to_string());
        args.push(self.container_name.clone());

        if let Some(limits) = &self.resources {
            args.push(format!("--cpus={}", limits.cpus));
            args.push(format!("--memory={}", limits.memory));
        }

        for (key, value) in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push("--network".to_string());
        args.push(self.network.clone());
        if self.read_only_root {
            args.push("--read-only".to_string());
        }
        args.push("--tmpfs".to_string());
        args.push(self.tmpfs.clone());

        args.push(self.image.clone());
        args
    }
}

/// Result of a single request/response runtime invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text shown for a successful call: stdout, else stderr, else `OK`.
    pub fn text(&self) -> String {
        if !self.stdout.is_empty() {
            self.stdout.clone()
        } else if !self.stderr.is_empty() {
            self.stderr.clone()
        } else {
            "OK".to_string()
        }
    }

    /// Text shown for a failed call: stderr, else a description of the exit.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.is_empty() {
            return self.stderr.clone();
        }
        match self.exit_code {
            Some(code) => format!("command exited with status {}", code),
            None => "command terminated by signal".to_string(),
        }
    }
}

/// Which output channel of the log-follow process a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogChunk {
    pub stream: LogStream,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl LogChunk {
    pub fn new(stream: LogStream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    pub fn is_error_channel(&self) -> bool {
        self.stream == LogStream::Stderr
    }
}

/// Container state as reported by the runtime at the time of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ContainerState {
    Running,
    /// Exists but is not running; carries the runtime's state name.
    NotRunning(String),
    NotFound,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Running => write!(f, "running"),
            ContainerState::NotRunning(state) => write!(f, "not running ({})", state),
            ContainerState::NotFound => write!(f, "not found"),
        }
    }
}
