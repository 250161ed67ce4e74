use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::session_management::session::LogSession;

/// The session currently occupying the manager's slot: its metadata, the
/// channel used to cancel it, and the task pumping its output.
pub struct ActiveSession {
    pub session: LogSession,
    pub(crate) cancel: Option<oneshot::Sender<()>>,
    pub(crate) task: JoinHandle<()>,
}

impl ActiveSession {
    /// Signals the pump task to terminate the follow process.
    pub(crate) fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}
