//! Recording fake runtime shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use crate::container_management::runtime_adapter::{ContainerRuntime, LogFollower};
use crate::container_management::types::{CommandOutput, LogChunk, LogStream};
use crate::error_handling::types::AdapterError;

pub(crate) fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

pub(crate) fn failed(stderr: &str, code: i32) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(code),
    }
}

struct FollowControl {
    args: Vec<String>,
    sender: Option<mpsc::UnboundedSender<LogChunk>>,
    terminate: oneshot::Receiver<()>,
    terminated: bool,
}

/// Records every call and replays queued responses per subcommand
/// (`run`, `stop`, `inspect`, ...). Unqueued calls succeed with empty output.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    calls: Mutex<Vec<Vec<String>>>,
    responses: Mutex<HashMap<String, VecDeque<Result<CommandOutput, AdapterError>>>>,
    follows: Mutex<Vec<FollowControl>>,
    follow_failure: Mutex<Option<String>>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, command: &str, output: CommandOutput) {
        self.queue(command, Ok(output));
    }

    pub(crate) fn respond_err(&self, command: &str, err: AdapterError) {
        self.queue(command, Err(err));
    }

    fn queue(&self, command: &str, response: Result<CommandOutput, AdapterError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// First argument of every request/response call, in order.
    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.first().cloned().unwrap_or_default())
            .collect()
    }

    pub(crate) fn last_call(&self, command: &str) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.first().map(String::as_str) == Some(command))
    }

    pub(crate) fn follow_count(&self) -> usize {
        self.follows.lock().unwrap().len()
    }

    pub(crate) fn follow_args(&self, index: usize) -> Vec<String> {
        self.follows.lock().unwrap()[index].args.clone()
    }

    pub(crate) fn fail_follow(&self, message: &str) {
        *self.follow_failure.lock().unwrap() = Some(message.to_string());
    }

    /// Pushes a chunk into the most recent follow stream.
    pub(crate) fn emit(&self, stream: LogStream, text: &str) {
        let follows = self.follows.lock().unwrap();
        let sender = follows
            .last()
            .and_then(|f| f.sender.as_ref())
            .expect("no open follow stream");
        sender.send(LogChunk::new(stream, text)).expect("follower dropped");
    }

    /// Closes the most recent follow stream, as if the container went away.
    pub(crate) fn close_stream(&self) {
        if let Some(f) = self.follows.lock().unwrap().last_mut() {
            f.sender = None;
        }
    }

    pub(crate) fn was_terminated(&self, index: usize) -> bool {
        let mut follows = self.follows.lock().unwrap();
        let control = &mut follows[index];
        if !control.terminated {
            control.terminated = control.terminate.try_recv().is_ok();
        }
        control.terminated
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    fn backend_name(&self) -> &str {
        "fake"
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput, AdapterError> {
        self.calls.lock().unwrap().push(args.to_vec());
        let command = args.first().cloned().unwrap_or_default();
        let queued = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&command)
            .and_then(|q| q.pop_front());
        queued.unwrap_or_else(|| Ok(ok("")))
    }

    fn follow(&self, args: &[String]) -> Result<LogFollower, AdapterError> {
        if let Some(message) = self.follow_failure.lock().unwrap().clone() {
            return Err(AdapterError::RuntimeNotAvailable(message));
        }
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (terminate_tx, terminate_rx) = oneshot::channel();
        self.follows.lock().unwrap().push(FollowControl {
            args: args.to_vec(),
            sender: Some(chunk_tx),
            terminate: terminate_rx,
            terminated: false,
        });
        Ok(LogFollower::new(chunk_rx, terminate_tx))
    }
}

/// Sink that records everything it receives.
pub(crate) fn collecting_sink() -> (crate::session_management::LogSink, Arc<Mutex<Vec<String>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let clone = Arc::clone(&received);
    let sink: crate::session_management::LogSink =
        Arc::new(move |text: &str| clone.lock().unwrap().push(text.to_string()));
    (sink, received)
}
