//! Boundary over the container runtime's command-line interface.
//!
//! The controller only needs two things from a runtime: a request/response
//! call for `run`/`stop`/`inspect`, and a streaming call for `logs -f` that
//! can be terminated. [`CliRuntime`] implements both on top of
//! `tokio::process`; tests substitute a recording fake.

use async_trait::async_trait;
use log::{debug, warn};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::container_management::types::{CommandOutput, LogChunk, LogStream};
use crate::error_handling::types::AdapterError;

/// Live output of a log-follow process.
///
/// The chunk channel closes once the process has exited and both of its
/// output streams are drained.
#[derive(Debug)]
pub struct LogFollower {
    chunks: mpsc::UnboundedReceiver<LogChunk>,
    terminate: Option<oneshot::Sender<()>>,
}

impl LogFollower {
    pub fn new(chunks: mpsc::UnboundedReceiver<LogChunk>, terminate: oneshot::Sender<()>) -> Self {
        Self {
            chunks,
            terminate: Some(terminate),
        }
    }

    /// Next chunk from either stream, `None` once the process has ended.
    pub async fn next_chunk(&mut self) -> Option<LogChunk> {
        self.chunks.recv().await
    }

    /// Asks the adapter to kill the underlying process. Idempotent.
    pub fn terminate(&mut self) {
        if let Some(tx) = self.terminate.take() {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Human-readable backend name (e.g. "docker").
    fn backend_name(&self) -> &str;

    /// Runs one runtime command to completion.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::success`].
    async fn run(&self, args: &[String]) -> Result<CommandOutput, AdapterError>;

    /// Spawns a long-running command whose output is streamed back.
    fn follow(&self, args: &[String]) -> Result<LogFollower, AdapterError>;
}

/// Runtime backed by a CLI binary such as `docker` or `podman`.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> AdapterError {
        if err.kind() == ErrorKind::NotFound {
            AdapterError::RuntimeNotAvailable(format!("{}: {}", self.binary, err))
        } else {
            AdapterError::IoError(err)
        }
    }
}

#[async_trait]
impl ContainerRuntime for CliRuntime {
    fn backend_name(&self) -> &str {
        &self.binary
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput, AdapterError> {
        debug!("Running {} {:?}", self.binary, args);
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        debug!(
            "{} {} exited with {:?}",
            self.binary,
            args.first().map(String::as_str).unwrap_or_default(),
            result.exit_code
        );
        Ok(result)
    }

    fn follow(&self, args: &[String]) -> Result<LogFollower, AdapterError> {
        debug!("Following {} {:?}", self.binary, args);
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (terminate_tx, mut terminate_rx) = oneshot::channel::<()>();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_stream(stdout, LogStream::Stdout, chunk_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_stream(stderr, LogStream::Stderr, chunk_tx));
        }

        let binary = self.binary.clone();
        tokio::spawn(async move {
            let terminated = tokio::select! {
                status = child.wait() => {
                    debug!("{} log follower exited: {:?}", binary, status);
                    false
                }
                // Either an explicit terminate or the follower being dropped.
                _ = &mut terminate_rx => true,
            };
            if terminated {
                debug!("Terminating {} log follower", binary);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {} log follower: {}", binary, e);
                }
            }
        });

        Ok(LogFollower::new(chunk_rx, terminate_tx))
    }
}

/// Forwards raw chunks from one output stream until EOF or a read error.
async fn pump_stream<R>(mut reader: R, stream: LogStream, tx: mpsc::UnboundedSender<LogChunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = take_complete_utf8(&mut pending);
                if !text.is_empty() && tx.send(LogChunk::new(stream, text)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Log stream {:?} read error: {}", stream, e);
                break;
            }
        }
    }
    if !pending.is_empty() {
        let _ = tx.send(LogChunk::new(stream, String::from_utf8_lossy(&pending).into_owned()));
    }
    debug!("Log stream {:?} reached EOF", stream);
}

/// Decodes `pending` up to a trailing incomplete character, which is left in
/// the buffer for the next read.
fn take_complete_utf8(pending: &mut Vec<u8>) -> String {
    let complete = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    let tail = pending.split_off(complete);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}
