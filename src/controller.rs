//! Application controller: wires configuration, the runtime adapter and the
//! lifecycle controller together, and maps operator requests to operations.

pub mod console;
pub mod controller_handler;

pub use controller_handler::{Controller, Report, Request};
