// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dazzle — control panel for the local ZPL print service.
//
// Entry point. Initialises logging, resolves the service address and runs
// one subcommand against it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use dazzle_app::{PanelState, PanelStore};
use dazzle_bridge::{Backend, MemoryBackend, PushEvent};
use dazzle_client::{DEFAULT_WATCH_INTERVAL, DazzleClient, Payload, WatchScheduler};
use dazzle_core::error::{DazzleError, Result};
use dazzle_core::human_errors::humanize_error;
use dazzle_core::{AppConfig, ClientOptions, PrintOptions, Protocol};

const PANEL_REFRESH: Duration = Duration::from_millis(250);
const PANEL_JOB_ROWS: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "dazzle", version, about = "Control panel for the local ZPL print service")]
struct Cli {
    /// Print service host (overrides DAZZLE_HOST).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Print service port (overrides DAZZLE_PORT).
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Talk to the service over HTTPS.
    #[arg(long, global = true)]
    https: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show whether the service is up and which version it runs.
    Status,
    /// List the printers the service can reach.
    Printers,
    /// Print ZPL files in order, a label URL, or stdin.
    Print {
        /// Files to print, in order. Reads stdin when none are given.
        files: Vec<PathBuf>,
        /// Printer to use instead of the service's selection.
        #[arg(long)]
        printer: Option<String>,
        /// Download the label from this URL and print it.
        #[arg(long, conflicts_with = "files")]
        url: Option<String>,
    },
    /// Report every change in service reachability until interrupted.
    Watch {
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },
    /// Live panel: printers, selection, server state and recent jobs.
    Panel {
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = resolve_options(&cli);
    info!(base_url = %options.base_url(), "Dazzle starting");

    match run(cli.command, &options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn resolve_options(cli: &Cli) -> ClientOptions {
    let mut options = ClientOptions::from_env();
    if let Some(host) = &cli.host {
        options.host = host.clone();
    }
    if let Some(port) = cli.port {
        options.port = port;
    }
    if cli.https {
        options.protocol = Protocol::Https;
    }
    options
}

async fn run(command: Command, options: &ClientOptions) -> Result<()> {
    let client = DazzleClient::new(options)?;

    match command {
        Command::Status => {
            if !client.is_running().await {
                println!("Dazzle is not running at {}", client.base_url());
                return Ok(());
            }
            let status = client.status().await?;
            println!("Dazzle {} is {} at {}", status.version, status.status, client.base_url());
        }

        Command::Printers => {
            let printers = client.printers().await?;
            if printers.is_empty() {
                println!("No printers found.");
            }
            for p in printers {
                let marker = if p.is_default { " (default)" } else { "" };
                println!("{}{marker}", p.name);
            }
        }

        Command::Print {
            files,
            printer,
            url,
        } => {
            let print_options = PrintOptions { printer };
            let results = match url {
                Some(url) => vec![client.print_url(&url, &print_options).await?],
                None => {
                    let payloads = read_payloads(&files).await?;
                    client.print_many(payloads, &print_options).await?
                }
            };
            for result in results {
                println!("queued {}", result.job_id);
            }
        }

        Command::Watch { interval_ms } => {
            let scheduler = WatchScheduler::new(Arc::new(client));
            let base_url = options.base_url();
            let handle = scheduler.watch(
                move |running| {
                    let now = chrono::Local::now().format("%H:%M:%S");
                    let state = if running { "up" } else { "down" };
                    println!("{now} {base_url} {state}");
                },
                Duration::from_millis(interval_ms),
            );
            wait_for_interrupt().await;
            handle.unwatch();
        }

        Command::Panel { interval_ms } => {
            run_panel(client, options, Duration::from_millis(interval_ms)).await?;
        }
    }

    Ok(())
}

async fn read_payloads(files: &[PathBuf]) -> Result<Vec<Payload>> {
    if files.is_empty() {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| DazzleError::InvalidPayload(format!("stdin: {e}")))?;
        return Ok(vec![Payload::Bytes(bytes)]);
    }

    let mut payloads = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DazzleError::InvalidPayload(format!("{}: {e}", path.display())))?;
        payloads.push(Payload::Bytes(bytes));
    }
    Ok(payloads)
}

/// Seed an in-memory backend from the live service and drive it from a
/// reachability watcher, then render the store whenever it changes.
async fn run_panel(client: DazzleClient, options: &ClientOptions, interval: Duration) -> Result<()> {
    let client = Arc::new(client);
    let running = client.is_running().await;
    let printers = if running {
        client.printers().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not list printers");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let backend = Arc::new(
        MemoryBackend::new()
            .with_printers(printers)
            .with_config(AppConfig {
                port: options.port,
                ..AppConfig::default()
            })
            .with_running(running),
    );
    let store = PanelStore::new(Arc::clone(&backend) as Arc<dyn Backend>);
    store.bootstrap().await?;

    let scheduler = WatchScheduler::new(client);
    let emitter = Arc::clone(&backend);
    let handle = scheduler.watch(
        move |running| {
            emitter.emit(PushEvent::ServerStatus(running));
        },
        interval,
    );

    let mut shown = store.snapshot();
    render(&shown);
    let interrupt = wait_for_interrupt();
    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            _ = &mut interrupt => break,
            _ = tokio::time::sleep(PANEL_REFRESH) => {
                let current = store.snapshot();
                if current != shown {
                    render(&current);
                    shown = current;
                }
            }
        }
    }

    handle.unwatch();
    store.shutdown();
    Ok(())
}

fn render(state: &PanelState) {
    println!("----");
    let server = if state.server_running { "running" } else { "stopped" };
    println!("Server:   {server} (port {})", state.config.port);
    if let Some(error) = &state.server_error {
        println!("Error:    {error}");
    }
    println!("Printer:  {}", state.selected_printer().unwrap_or("(none)"));
    for p in &state.printers {
        let marker = if p.is_default { " (default)" } else { "" };
        println!("          - {}{marker}", p.name);
    }
    if state.print_jobs.is_empty() {
        println!("Jobs:     none");
        return;
    }
    println!("Jobs:");
    for job in state.print_jobs.iter().take(PANEL_JOB_ROWS) {
        let when = job
            .submitted_at()
            .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".into());
        let status = format!("{:?}", job.status).to_lowercase();
        println!("  {when} {status:<10} {} {}", job.printer, job.id);
    }
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_to_watch_default() {
        let default_ms = DEFAULT_WATCH_INTERVAL.as_millis() as u64;

        let cli = Cli::try_parse_from(["dazzle", "watch"]).unwrap();
        assert!(matches!(cli.command, Command::Watch { interval_ms } if interval_ms == default_ms));

        let cli = Cli::try_parse_from(["dazzle", "panel"]).unwrap();
        assert!(matches!(cli.command, Command::Panel { interval_ms } if interval_ms == default_ms));
    }

    #[test]
    fn interval_can_be_overridden() {
        let cli = Cli::try_parse_from(["dazzle", "watch", "--interval-ms", "250"]).unwrap();
        assert!(matches!(cli.command, Command::Watch { interval_ms: 250 }));
    }
}
