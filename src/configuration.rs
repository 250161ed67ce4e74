//! Runtime configuration for the sandbox controller.
//!
//! Settings come from an optional TOML file and can be overridden from the
//! command line. Every field has a default, so an empty file (or no file at
//! all) yields the stock `docker run ... sandbox-browser` setup.

pub mod config;
pub mod types;

pub use config::ConfigOverrides;
pub use types::Config;
