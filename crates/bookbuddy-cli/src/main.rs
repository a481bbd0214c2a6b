//! BookBuddy CLI - ask the BookBuddy librarian from a terminal.
//!
//! Signs in against the BookBuddy backend, keeps the token pair between
//! runs, and prints recommendations, book details and follow-up answers.

mod cli;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bookbuddy_core::{BookBuddy, Config, Navigator};

use cli::Cli;

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines on drop.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

/// Terminal stand-in for browser navigation
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, location: &str) {
        if location.starts_with("http://") || location.starts_with("https://") {
            info!(location, "Redirect");
        } else {
            info!(location, "Returned to start view");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let guard = init_tracing();
    let args = Cli::parse();

    let config = Config::load()?;
    info!(api_url = %config.api_url, "BookBuddy CLI starting");

    let tokens = BookBuddy::token_store(&config)?;
    let client = BookBuddy::new(&config, tokens, Arc::new(TerminalNavigator))?;
    client.session.check_session().await;

    let result = cli::run(&client, args.command).await;
    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }

    // Flush logs before a non-zero exit skips destructors
    drop(guard);
    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
