pub mod configuration;
pub mod container_management;
pub mod controller;
pub mod error_handling;
pub mod session_management;

pub use container_management::{LifecycleController, Preset};
pub use controller::Controller;
