mod config;
mod host;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;

use livelog_stream::{LogEvent, LogLevel, LogStreamEngine};

use crate::config::Config;
use crate::host::LocalHost;

/// Livelog - streams annotated log lines to per-identity publish channels
#[derive(Parser, Debug)]
#[command(name = "livelog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Identity the local stream is published under
    #[arg(long, default_value = "local")]
    identity: String,

    /// Ambient scope identifier
    #[arg(long, default_value = "default")]
    scope: String,

    /// Maximum number of log lines to keep per stream (overrides config)
    #[arg(long)]
    max_lines: Option<usize>,

    /// Publish throttle, 0 pushes every update (overrides config)
    #[arg(long)]
    update_period: Option<u64>,

    /// Prefix each line with the current time before formatting
    #[arg(long)]
    stamp: bool,

    /// Print every published snapshot to stdout
    #[arg(long)]
    echo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for diagnostics
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(max_lines) = args.max_lines {
        config.stream.max_lines = max_lines;
    }
    if let Some(period) = args.update_period {
        config.stream.update_period = period;
    }

    let host = Arc::new(LocalHost::new(&args.scope, &args.identity));
    let engine = LogStreamEngine::with_config(host.clone(), config.stream, config.theme);

    let cancel = CancellationToken::new();
    let echo_task = args
        .echo
        .then(|| spawn_echo(host.clone(), args.identity.clone(), cancel.clone()));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            line = lines.next_line() => {
                match line.context("failed to read from stdin")? {
                    Some(text) => {
                        let level = detect_level(&text);
                        let text = if args.stamp {
                            format!("{} {}", chrono::Local::now().format("%H:%M:%S%.3f"), text)
                        } else {
                            text
                        };
                        engine.process(LogEvent::new(text, level));
                    }
                    None => break,
                }
            }
        }
    }

    cancel.cancel();
    if let Some(task) = echo_task {
        let _ = task.await;
    }
    engine.shutdown();

    Ok(())
}

/// Mirror published snapshots for one identity onto stdout
fn spawn_echo(
    host: Arc<LocalHost>,
    identity: String,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // The channel only exists once the first line for the identity
        // arrives.
        let mut rx = loop {
            if let Some(rx) = host.subscribe(&identity) {
                break rx;
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,

                changed = rx.changed() => {
                    if changed.is_ok() {
                        let value = rx.borrow_and_update().clone();
                        println!("--- {identity} ---");
                        println!("{value}");
                    } else {
                        // The stream was evicted and its channel replaced;
                        // pick up the new one.
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        if let Some(new_rx) = host.subscribe(&identity) {
                            rx = new_rx;
                        }
                    }
                }
            }
        }
    })
}

/// Severity the log hook would report for a plain text line
fn detect_level(text: &str) -> LogLevel {
    let upper = text.to_uppercase();
    let patterns = [
        ("[ERROR]", LogLevel::Error),
        ("[ERR]", LogLevel::Error),
        ("ERROR:", LogLevel::Error),
        ("[WARNING]", LogLevel::Warning),
        ("[WARN]", LogLevel::Warning),
        ("WARNING:", LogLevel::Warning),
        ("WARN:", LogLevel::Warning),
    ];
    for (pattern, level) in patterns {
        if upper.contains(pattern) {
            return level;
        }
    }
    LogLevel::None
}
