//! Vortex - a terminal front end for the Vortex HR system.
//!
//! Signs in against the HR backend, keeps the session across runs and lets
//! you open views and call the API with role-based access applied exactly
//! as in the web client.

mod app;
mod input;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vortex_core::config::{Config, StorageBackend};

use app::App;
use input::Command;

/// Log file name inside the log directory
const LOG_FILE: &str = "vortex.log";

const USAGE: &str = "\
Usage: vortex [--api-url <url>] [--ephemeral]

  --api-url <url>   backend base URL (also VORTEX_API_URL)
  --ephemeral       keep the session in memory only
  -h, --help        show this help";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so they do not interleave with the prompt; stderr is
/// used when no log directory is available.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = config.log_dir().ok().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE)
            .build(dir)
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn apply_args(config: &mut Config, args: &[String]) -> Result<bool> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api-url" => {
                let url = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--api-url needs a value"))?;
                config.api_url_override = Some(url.clone());
            }
            "--ephemeral" => config.storage = StorageBackend::Memory,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(false);
            }
            other => return Err(anyhow::anyhow!("Unknown argument '{}'\n\n{}", other, USAGE)),
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    let args: Vec<String> = std::env::args().collect();
    if !apply_args(&mut config, &args)? {
        return Ok(());
    }

    let _log_guard = init_tracing(&config);
    info!(base_url = %config.api_base_url(), "Vortex starting");

    let mut app = App::new(config)?;
    if app.uses_ephemeral_storage() {
        println!("Ephemeral mode: the session is not saved.");
    }
    app.start();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", app.prompt());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match Command::parse(&line) {
            Ok(command) => {
                if !app.handle(command).await {
                    break;
                }
            }
            Err(msg) if msg.is_empty() => {}
            Err(msg) => println!("{}", msg),
        }
    }

    info!("Vortex shutting down");
    Ok(())
}
