use log::{debug, error, info};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::{broadcast, Mutex};

use crate::configuration::Config;
use crate::container_management::command_builder::CommandBuilder;
use crate::container_management::runtime_adapter::ContainerRuntime;
use crate::container_management::types::{ContainerState, Preset};
use crate::error_handling::types::{AdapterError, ContainerError};
use crate::session_management::{LogEvent, LogSession, LogSessionManager, LogSink, Subscription};

/// Returned by [`LifecycleController::stop`] when the stop command fails.
pub const STOP_NOT_FOUND: &str = "already stopped or not found";

static RUNTIME_UNREACHABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)cannot connect to the docker daemon|is the docker daemon running|error during connect|executable file not found|permission denied while trying to connect",
    )
    .expect("static pattern")
});

static NO_SUCH_CONTAINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no such (object|container)").expect("static pattern"));

/// Controls the lifecycle of the single sandbox container.
///
/// The container itself is never tracked in memory: whether it exists is
/// always asked of the runtime. Lifecycle operations (`start`, `stop`,
/// `reset`) are serialized by an internal guard so overlapping requests run
/// one after the other instead of racing for the container name. Log
/// streaming is delegated to a [`LogSessionManager`] and is independent of
/// that guard.
pub struct LifecycleController {
    runtime: Arc<dyn ContainerRuntime>,
    commands: CommandBuilder,
    operations: Mutex<()>,
    logs: LogSessionManager,
}

impl LifecycleController {
    pub fn new(config: Config, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let commands = CommandBuilder::new(config);
        let logs = LogSessionManager::new(
            Arc::clone(&runtime),
            commands.container_name(),
            commands.follow_logs_args(),
        );
        info!(
            "LifecycleController ready for container {} using {}",
            commands.container_name(),
            runtime.backend_name()
        );
        Self {
            runtime,
            commands,
            operations: Mutex::new(()),
            logs,
        }
    }

    pub fn container_name(&self) -> &str {
        self.commands.container_name()
    }

    /// Replaces the container with a fresh one launched for `preset`.
    ///
    /// Any existing container is stopped first; a failed stop (typically
    /// "no such container") is ignored and the launch is attempted anyway.
    ///
    /// # Errors
    /// Returns the runtime's diagnostic text when the launch itself fails.
    pub async fn start(&self, preset: Option<Preset>) -> Result<String, ContainerError> {
        let _guard = self.operations.lock().await;
        self.replace(preset).await
    }

    /// [`start`](Self::start) for a raw preset name; unknown names start the
    /// default configuration.
    pub async fn start_named(&self, name: Option<&str>) -> Result<String, ContainerError> {
        let preset = name.and_then(Preset::parse);
        if let (Some(raw), None) = (name, preset) {
            debug!("Unrecognized preset {:?}, using default configuration", raw);
        }
        self.start(preset).await
    }

    /// Stops the container. Never fails: if the runtime reports an error the
    /// container is assumed to be gone and [`STOP_NOT_FOUND`] is returned.
    pub async fn stop(&self) -> String {
        let _guard = self.operations.lock().await;
        match self.invoke(self.commands.stop_args()).await {
            Ok(output) => {
                info!("Stopped container {}", self.container_name());
                output
            }
            Err(e) => {
                debug!("Stop of {} failed: {}", self.container_name(), e);
                STOP_NOT_FOUND.to_string()
            }
        }
    }

    /// Stops whatever is running and starts the default configuration,
    /// discarding any previously selected preset.
    pub async fn reset(&self) -> Result<String, ContainerError> {
        let _guard = self.operations.lock().await;
        self.stop_quietly().await;
        self.replace(None).await
    }

    /// Asks the runtime for the container's current state.
    pub async fn status(&self) -> Result<ContainerState, ContainerError> {
        let output = self
            .runtime
            .run(&self.commands.inspect_state_args())
            .await
            .map_err(|e| classify(e, ContainerError::QueryFailed))?;

        if output.success() {
            let state = output.stdout.trim();
            return Ok(if state == "running" {
                ContainerState::Running
            } else {
                ContainerState::NotRunning(state.to_string())
            });
        }

        let diagnostic = output.diagnostic();
        if NO_SUCH_CONTAINER.is_match(&diagnostic) {
            Ok(ContainerState::NotFound)
        } else {
            Err(classify(
                AdapterError::CommandFailed(diagnostic),
                ContainerError::QueryFailed,
            ))
        }
    }

    /// Starts streaming container logs into `sink` unless already streaming.
    pub fn subscribe_logs(&self, sink: LogSink) -> Result<Subscription, ContainerError> {
        self.logs.subscribe(sink)
    }

    /// Stops the log stream if one is live. Returns whether one was stopped.
    pub async fn unsubscribe_logs(&self) -> bool {
        self.logs.unsubscribe().await
    }

    pub fn log_events(&self) -> broadcast::Receiver<LogEvent> {
        self.logs.events()
    }

    pub fn log_session(&self) -> Option<LogSession> {
        self.logs.current()
    }

    /// Stop-before-start: clears the container slot, then launches.
    async fn replace(&self, preset: Option<Preset>) -> Result<String, ContainerError> {
        self.stop_quietly().await;
        self.launch(preset).await
    }

    async fn stop_quietly(&self) {
        if let Err(e) = self.invoke(self.commands.stop_args()).await {
            debug!("Ignoring stop failure for {}: {}", self.container_name(), e);
        }
    }

    async fn launch(&self, preset: Option<Preset>) -> Result<String, ContainerError> {
        let spec = self.commands.build_launch_spec(preset);
        info!(
            "Launching container {} with preset {}",
            spec.container_name,
            preset.map(|p| p.as_str()).unwrap_or("default")
        );

        self.invoke(spec.to_args()).await.map_err(|e| {
            let err = classify(e, ContainerError::LaunchFailed);
            error!("Launch of {} failed: {}", spec.container_name, err);
            err
        })
    }

    /// Runs one runtime command; a non-zero exit becomes `CommandFailed`.
    async fn invoke(&self, args: Vec<String>) -> Result<String, AdapterError> {
        debug!("Invoking {} {:?}", self.runtime.backend_name(), args);
        let output = self.runtime.run(&args).await?;
        if output.success() {
            Ok(output.text())
        } else {
            Err(AdapterError::CommandFailed(output.diagnostic()))
        }
    }
}

/// Maps an adapter failure to the controller's taxonomy. Diagnostics that say
/// the runtime daemon is unreachable become `RuntimeNotAvailable`; other
/// command failures are wrapped by `failed`.
fn classify(err: AdapterError, failed: fn(String) -> ContainerError) -> ContainerError {
    match err {
        AdapterError::RuntimeNotAvailable(e) => ContainerError::RuntimeNotAvailable(e),
        AdapterError::CommandFailed(e) if RUNTIME_UNREACHABLE.is_match(&e) => {
            ContainerError::RuntimeNotAvailable(e)
        }
        AdapterError::CommandFailed(e) => failed(e),
        AdapterError::IoError(e) => ContainerError::IoError(e),
    }
}
