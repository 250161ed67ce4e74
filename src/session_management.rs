//! Log session management.
//!
//! A log session is the single live `logs -f` process tailing the sandbox
//! container. At most one exists at a time; its output goes to the sink given
//! at subscription and is also broadcast as [`LogEvent`]s to any number of
//! observers.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::container_management::types::LogChunk;

/// Submodule for the running-session handle.
pub mod active_session;
/// Submodule for session metadata.
pub mod session;
/// Submodule for the session manager implementation.
pub mod session_manager;

pub use session::LogSession;
pub use session_manager::{LogSessionManager, Subscription};

/// Text delivered to the sink after the follow process has ended.
pub const LOG_STREAM_ENDED: &str = "\n[log stream ended]\n";

/// Callback receiving every chunk of log text, then [`LOG_STREAM_ENDED`].
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Why a log session ended.
///
/// Variants:
/// - `StreamClosed`: the follow process exited on its own (container stopped,
///   removed, or never running).
/// - `Unsubscribed`: the session was terminated by an explicit unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    StreamClosed,
    Unsubscribed,
}

/// Event published to every observer of the log stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    Chunk { session_id: Uuid, chunk: LogChunk },
    Ended { session_id: Uuid, reason: SessionEnd },
}
