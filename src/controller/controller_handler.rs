use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::configuration::Config;
use crate::container_management::{
    CliRuntime, ContainerRuntime, ContainerState, LifecycleController, Preset,
};
use crate::error_handling::types::ControllerError;

/// A lifecycle request from the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Start with an optional raw preset name.
    Start(Option<String>),
    Stop,
    Reset,
    Status,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Start(_) => "start",
            Request::Stop => "stop",
            Request::Reset => "reset",
            Request::Status => "status",
        }
    }
}

/// What the presentation layer renders after a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub operation: &'static str,
    pub success: bool,
    /// Runtime output on success, runtime diagnostic on failure.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ContainerState>,
}

impl Report {
    fn new(operation: &'static str, success: bool, message: String) -> Self {
        Self {
            operation,
            success,
            message,
            preset: None,
            state: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

pub struct Controller {
    pub config: Config,
    lifecycle: LifecycleController,
}

impl Controller {
    /// Builds a controller driving the runtime binary named in `config`.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        config.validate()?;
        let runtime = Arc::new(CliRuntime::new(config.runtime.as_str()));
        Ok(Self::with_runtime(config, runtime))
    }

    pub fn with_runtime(config: Config, runtime: Arc<dyn ContainerRuntime>) -> Self {
        info!("Creating controller for container {}", config.container_name);
        let lifecycle = LifecycleController::new(config.clone(), runtime);
        Self { config, lifecycle }
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub async fn execute(&self, request: Request) -> Report {
        debug!("Executing request {:?}", request);
        let operation = request.name();
        match request {
            Request::Start(name) => {
                let preset = name.as_deref().and_then(Preset::parse);
                let mut report = match self.lifecycle.start_named(name.as_deref()).await {
                    Ok(output) => Report::new(operation, true, output),
                    Err(e) => Report::new(operation, false, e.diagnostic()),
                };
                report.preset = preset;
                report
            }
            Request::Stop => Report::new(operation, true, self.lifecycle.stop().await),
            Request::Reset => match self.lifecycle.reset().await {
                Ok(output) => Report::new(operation, true, output),
                Err(e) => Report::new(operation, false, e.diagnostic()),
            },
            Request::Status => match self.lifecycle.status().await {
                Ok(state) => {
                    let mut report = Report::new(operation, true, state.to_string());
                    report.state = Some(state);
                    report
                }
                Err(e) => Report::new(operation, false, e.diagnostic()),
            },
        }
    }

    /// Ends the log stream and, when `stop_on_exit` is set, stops the
    /// container. Results are not reported.
    pub async fn shutdown(&self) {
        info!("Shutting down controller");
        self.lifecycle.unsubscribe_logs().await;
        if self.config.stop_on_exit {
            let output = self.lifecycle.stop().await;
            debug!("Stop on exit: {}", output.trim());
        }
    }
}
