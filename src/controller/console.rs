//! Line-oriented operator console.
//!
//! Keeps one [`Controller`] alive for the whole session, so the log stream
//! and the stop-on-exit behaviour work the way they do behind a desktop UI.

use log::{debug, warn};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::container_management::Preset;
use crate::controller::controller_handler::{Controller, Report, Request};
use crate::error_handling::types::ControllerError;
use crate::session_management::{LogSink, Subscription};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Lifecycle(Request),
    FollowLogs,
    StopLogs,
    Help,
    Quit,
}

/// Parses one console line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };
    let second = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    let command = match (first.to_lowercase().as_str(), second) {
        ("start", preset) => ConsoleCommand::Lifecycle(Request::Start(preset.map(str::to_string))),
        ("stop", None) => ConsoleCommand::Lifecycle(Request::Stop),
        ("reset", None) => ConsoleCommand::Lifecycle(Request::Reset),
        ("status", None) => ConsoleCommand::Lifecycle(Request::Status),
        ("logs", None) | ("logs", Some("start")) => ConsoleCommand::FollowLogs,
        ("logs", Some("stop")) => ConsoleCommand::StopLogs,
        ("help", None) | ("?", None) => ConsoleCommand::Help,
        ("quit", None) | ("exit", None) | ("q", None) => ConsoleCommand::Quit,
        (_, Some(arg)) => return Err(format!("unexpected argument: {}", arg)),
        (other, None) => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

pub fn stdout_sink() -> LogSink {
    Arc::new(|text: &str| {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    })
}

pub fn render(report: &Report, json: bool) -> String {
    if json {
        return serde_json::to_string(report).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e));
    }
    let status = if report.success { "ok" } else { "error" };
    format!("[{}] {}: {}", report.operation, status, report.message.trim_end())
}

fn print_help() {
    let presets: Vec<&str> = Preset::ALL.iter().map(Preset::as_str).collect();
    println!("Commands:");
    println!("  start [PRESET]   start the sandbox (presets: {})", presets.join(", "));
    println!("  stop             stop the sandbox");
    println!("  reset            stop and start with the default configuration");
    println!("  status           show the container state");
    println!("  logs [stop]      follow or stop following the container logs");
    println!("  quit             leave the console");
}

/// Runs the console until `quit`, end of input, or Ctrl-C, then shuts the
/// controller down.
pub async fn run_console<R>(controller: &Controller, input: R, json: bool) -> Result<(), ControllerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!(
        "sandbox-browser console for container {}. Type 'help' for commands.",
        controller.config.container_name
    );

    // One listener for the whole session, also armed while an operation runs.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break Ok(());
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => {
                break Err(ControllerError::InitializationFailed(format!(
                    "failed to read console input: {}",
                    e
                )))
            }
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{} (type 'help')", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Lifecycle(request) => {
                let report = tokio::select! {
                    report = controller.execute(request) => report,
                    _ = &mut ctrl_c => {
                        debug!("Interrupted while an operation was running");
                        break Ok(());
                    }
                };
                println!("{}", render(&report, json));
            }
            ConsoleCommand::FollowLogs => match controller.lifecycle().subscribe_logs(stdout_sink()) {
                Ok(Subscription::Started(id)) => debug!("Following logs in session {}", id),
                Ok(Subscription::AlreadyStreaming(_)) => println!("logs already streaming"),
                Err(e) => println!("[logs] error: {}", e.diagnostic().trim_end()),
            },
            ConsoleCommand::StopLogs => {
                if !controller.lifecycle().unsubscribe_logs().await {
                    println!("no log stream to stop");
                }
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Quit => break Ok(()),
        }
    };

    if let Err(e) = &result {
        warn!("Console ended with error: {}", e);
    }
    controller.shutdown().await;
    result
}
