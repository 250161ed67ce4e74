use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::container_management::runtime_adapter::{ContainerRuntime, LogFollower};
use crate::error_handling::types::{AdapterError, ContainerError};
use crate::session_management::active_session::ActiveSession;
use crate::session_management::session::LogSession;
use crate::session_management::{LogEvent, LogSink, SessionEnd, LOG_STREAM_ENDED};

const EVENT_CAPACITY: usize = 256;

type Slot = Arc<Mutex<Option<ActiveSession>>>;

/// Outcome of a subscription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// A new follow process was spawned for this session.
    Started(Uuid),
    /// A session was already live; nothing was spawned and the sink was dropped.
    AlreadyStreaming(Uuid),
}

/// Owns the single log-follow session for one container.
///
/// The slot is the only shared state. Subscribe, unsubscribe and natural
/// termination all go through it under one mutex, and a session that ends on
/// its own only clears the slot if it still holds that same session.
pub struct LogSessionManager {
    runtime: Arc<dyn ContainerRuntime>,
    container_name: String,
    follow_args: Vec<String>,
    slot: Slot,
    events: broadcast::Sender<LogEvent>,
}

impl LogSessionManager {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        container_name: &str,
        follow_args: Vec<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            runtime,
            container_name: container_name.to_string(),
            follow_args,
            slot: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Starts following the container's logs unless a session is already live.
    ///
    /// Every chunk from either output stream is passed to `sink`; when the
    /// follow process ends the sink receives [`LOG_STREAM_ENDED`] and the
    /// session is cleared.
    ///
    /// # Errors
    /// Fails if the follow process cannot be spawned. No session is recorded
    /// in that case.
    pub fn subscribe(&self, sink: LogSink) -> Result<Subscription, ContainerError> {
        let mut slot = lock(&self.slot);
        if let Some(active) = slot.as_ref() {
            debug!(
                "Log session {} already streaming, ignoring subscribe",
                active.session.id
            );
            return Ok(Subscription::AlreadyStreaming(active.session.id));
        }

        let follower = self
            .runtime
            .follow(&self.follow_args)
            .map_err(stream_error)?;

        let session = LogSession::new(&self.container_name);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(pump_session(
            session.id,
            follower,
            cancel_rx,
            sink,
            self.events.clone(),
            Arc::clone(&self.slot),
        ));

        info!(
            "Log session {} started for container {}",
            session.id, self.container_name
        );
        let id = session.id;
        *slot = Some(ActiveSession {
            session,
            cancel: Some(cancel_tx),
            task,
        });
        Ok(Subscription::Started(id))
    }

    /// Terminates the live session, if any, and waits for its task to finish.
    ///
    /// Returns `false` when there was nothing to stop.
    pub async fn unsubscribe(&self) -> bool {
        let taken = lock(&self.slot).take();
        let Some(mut active) = taken else {
            debug!("No log session to stop");
            return false;
        };

        info!("Stopping log session {}", active.session.id);
        active.cancel();
        if let Err(e) = (&mut active.task).await {
            warn!("Log session {} task failed: {}", active.session.id, e);
        }
        true
    }

    pub fn current(&self) -> Option<LogSession> {
        lock(&self.slot).as_ref().map(|a| a.session.clone())
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Additional observer of the log stream. Slow receivers may lag.
    pub fn events(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }
}

impl Drop for LogSessionManager {
    fn drop(&mut self) {
        if let Some(mut active) = lock(&self.slot).take() {
            active.cancel();
        }
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<ActiveSession>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn stream_error(err: AdapterError) -> ContainerError {
    match err {
        AdapterError::RuntimeNotAvailable(e) => ContainerError::RuntimeNotAvailable(e),
        AdapterError::CommandFailed(e) => ContainerError::StreamFailed(e),
        AdapterError::IoError(e) => ContainerError::IoError(e),
    }
}

async fn pump_session(
    id: Uuid,
    mut follower: LogFollower,
    mut cancel_rx: oneshot::Receiver<()>,
    sink: LogSink,
    events: broadcast::Sender<LogEvent>,
    slot: Slot,
) {
    let reason = loop {
        tokio::select! {
            biased;
            // A dropped sender counts as cancellation too.
            _ = &mut cancel_rx => {
                follower.terminate();
                break SessionEnd::Unsubscribed;
            }
            chunk = follower.next_chunk() => match chunk {
                Some(chunk) => {
                    sink(&chunk.text);
                    let _ = events.send(LogEvent::Chunk { session_id: id, chunk });
                }
                None => break SessionEnd::StreamClosed,
            }
        }
    };

    sink(LOG_STREAM_ENDED);
    let _ = events.send(LogEvent::Ended {
        session_id: id,
        reason,
    });

    let mut guard = lock(&slot);
    if guard.as_ref().map(|a| a.session.id) == Some(id) {
        *guard = None;
    }
    drop(guard);
    info!("Log session {} ended: {:?}", id, reason);
}
