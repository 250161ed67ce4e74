//! Container management subsystem.
//!
//! This module drives the single sandbox container through the runtime CLI
//! (`docker` by default). The container is identified only by its fixed name;
//! nothing about it is cached in process.
//!
//! Re-exports:
//! - [`LifecycleController`]: start/stop/reset/status and log subscription.
//! - [`CommandBuilder`]: pure preset → [`LaunchSpec`] mapping.
//! - [`ContainerRuntime`], [`CliRuntime`]: the runtime adapter boundary.
//!
//! Example (non-running):
//! ```ignore
//! use std::sync::Arc;
//! use sandbox_browser::configuration::Config;
//! use sandbox_browser::container_management::{CliRuntime, LifecycleController, Preset};
//!
//! let controller = LifecycleController::new(Config::default(), Arc::new(CliRuntime::new("docker")));
//! let output = controller.start(Some(Preset::Safe)).await?;
//! println!("started: {}", output.trim());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command_builder;
pub mod lifecycle;
pub mod runtime_adapter;
#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
pub mod tests;
pub mod types;

pub use command_builder::CommandBuilder;
pub use lifecycle::{LifecycleController, STOP_NOT_FOUND};
pub use runtime_adapter::{CliRuntime, ContainerRuntime, LogFollower};
pub use types::{CommandOutput, ContainerState, LaunchSpec, LogChunk, LogStream, Preset};
