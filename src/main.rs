use clap::{Parser, Subcommand};
use log::{debug, error, LevelFilter};
use sandbox_browser::configuration::{Config, ConfigOverrides};
use sandbox_browser::controller::console::{render, run_console, stdout_sink};
use sandbox_browser::controller::{Controller, Report, Request};
use sandbox_browser::session_management::{LogEvent, Subscription};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(name = "sandbox-browser")]
#[command(version)]
#[command(about = "Launch, reset, stop and monitor the isolated browser sandbox container")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "SANDBOX_BROWSER_CONFIG")]
    config: Option<PathBuf>,

    /// Container runtime binary (overrides the file)
    #[arg(long, env = "SANDBOX_BROWSER_RUNTIME")]
    runtime: Option<String>,

    /// Image to launch (overrides the file)
    #[arg(long, env = "SANDBOX_BROWSER_IMAGE")]
    image: Option<String>,

    /// Network to attach the container to (overrides the file)
    #[arg(long)]
    network: Option<String>,

    /// Leave the container running when the console exits
    #[arg(long)]
    keep_running: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Replace the sandbox container with a fresh one
    Start {
        /// Resource preset: safe, malware, full or proxy
        #[arg(long)]
        preset: Option<String>,
    },
    /// Stop the sandbox container (never fails)
    Stop,
    /// Stop the container and start the default configuration
    Reset,
    /// Show the container state as reported by the runtime
    Status,
    /// Follow the container logs
    Logs(LogsArgs),
    /// Interactive console keeping one controller alive
    Console,
}

#[derive(clap::Args, Debug, PartialEq)]
#[group(required = true, multiple = false)]
struct LogsArgs {
    /// Stream logs until the container exits or Ctrl-C
    #[arg(long)]
    follow: bool,
    /// Stop the log stream owned by this process
    #[arg(long)]
    stop: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();

    let overrides = ConfigOverrides {
        runtime: cli.runtime.clone(),
        image: cli.image.clone(),
        network: cli.network.clone(),
        keep_running: cli.keep_running,
    };

    let config = Config::load(cli.config.as_deref(), overrides).unwrap_or_else(|e| {
        error!("Unable to load configuration: {}", e);
        std::process::exit(2);
    });

    let controller = Controller::new(config).unwrap_or_else(|e| {
        error!("Unable to create a controller instance: {}, exiting...", e);
        std::process::exit(2);
    });

    let code = match cli.command {
        Commands::Start { preset } => report(controller.execute(Request::Start(preset)).await, cli.json),
        Commands::Stop => report(controller.execute(Request::Stop).await, cli.json),
        Commands::Reset => report(controller.execute(Request::Reset).await, cli.json),
        Commands::Status => report(controller.execute(Request::Status).await, cli.json),
        Commands::Logs(LogsArgs { follow: true, .. }) => follow_logs(&controller).await,
        Commands::Logs(_) => {
            // Log sessions belong to the process that opened them.
            if !controller.lifecycle().unsubscribe_logs().await {
                eprintln!("no log stream to stop");
            }
            0
        }
        Commands::Console => {
            let input = BufReader::new(tokio::io::stdin());
            match run_console(&controller, input, cli.json).await {
                Ok(()) => 0,
                Err(e) => {
                    error!("{}", e);
                    1
                }
            }
        }
    };

    std::process::exit(code);
}

fn report(report: Report, json: bool) -> i32 {
    if json {
        println!("{}", render(&report, true));
    } else if report.success {
        println!("{}", report.message.trim_end());
    } else {
        eprintln!("{}", report.message.trim_end());
    }
    report.exit_code()
}

async fn follow_logs(controller: &Controller) -> i32 {
    let lifecycle = controller.lifecycle();
    let mut events = lifecycle.log_events();

    match lifecycle.subscribe_logs(stdout_sink()) {
        Ok(Subscription::Started(id)) => debug!("Following logs in session {}", id),
        Ok(Subscription::AlreadyStreaming(_)) => {}
        Err(e) => {
            eprintln!("{}", e.diagnostic().trim_end());
            return 1;
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(LogEvent::Ended { .. }) | Err(RecvError::Closed) => break,
                Ok(LogEvent::Chunk { .. }) | Err(RecvError::Lagged(_)) => {}
            },
            _ = &mut ctrl_c => {
                lifecycle.unsubscribe_logs().await;
                break;
            }
        }
    }
    0
}
