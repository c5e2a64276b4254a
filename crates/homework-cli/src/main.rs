//! Homework Bot CLI
//!
//! Main entry point: polls homework review statuses and forwards changes to
//! a Telegram chat until interrupted.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use homework_poller::{
    Credentials, PollCursor, PollLoop, PollerError, PracticumClient, Settings, TelegramNotifier,
};
use tracing_subscriber::EnvFilter;

/// Homework Bot - review status notifier
///
/// Polls the homework statuses API on a fixed interval and sends every new
/// review verdict to a Telegram chat. Credentials are read from the
/// PRACTICUM_TOKEN, TELEGRAM_TOKEN and TELEGRAM_CHAT_ID environment variables
/// (a .env file is honoured).
#[derive(Parser, Debug)]
#[command(name = "homework-bot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to settings file (default: homework-bot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Seconds between polls (overrides retryIntervalSecs)
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Initial cursor as a Unix timestamp (default: now)
    #[arg(long, value_name = "TIMESTAMP", allow_negative_numbers = true)]
    from_date: Option<i64>,

    /// Run a single iteration and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Homework bot starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_config_error(&e) {
                tracing::error!(error = %e, "Invalid configuration, polling not started");
            } else {
                tracing::error!(error = %e, "Homework bot stopped");
            }
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Returns `true` if `err` stems from a configuration problem found at startup.
fn is_config_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<PollerError>().is_some_and(PollerError::is_fatal)
}

/// Loads configuration, checks credentials and runs the poll loop.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);

    // Re-validate after overrides
    settings.validate()?;

    let credentials = Credentials::from_env()?;
    log_config(&settings, &credentials);

    let source = PracticumClient::from_config(&settings, &credentials)?;
    let notifier = TelegramNotifier::from_config(&settings, &credentials);

    match notifier.bot().get_me().await {
        Ok(me) => tracing::info!(
            bot = %me.first_name,
            username = ?me.username,
            "Telegram bot token accepted"
        ),
        Err(e) => tracing::warn!(error = %e, "Telegram health check failed; continuing"),
    }

    let cursor = args
        .from_date
        .map_or_else(PollCursor::now, PollCursor::from_timestamp);
    let mut poll_loop = PollLoop::new(source, notifier, cursor, settings.retry_interval());

    if args.once {
        let outcome = poll_loop.run_iteration().await;
        tracing::info!(?outcome, cursor = %poll_loop.cursor(), "Single iteration finished");
        if outcome.is_failure() {
            anyhow::bail!("iteration failed: {outcome:?}");
        }
        return Ok(());
    }

    poll_loop.run(shutdown_signal()).await;
    Ok(())
}

/// Loads settings from the specified path or default location.
fn load_settings(config_path: Option<&str>) -> anyhow::Result<Settings> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Settings::load_from_file(path)?)
        }
        None => Ok(Settings::load()?),
    }
}

/// Applies CLI argument overrides to loaded settings.
fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(interval) = args.interval {
        settings.retry_interval_secs = interval;
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C; stop the process externally");
            std::future::pending::<()>().await;
        }
    }
}

/// Logs the effective configuration without secrets.
fn log_config(settings: &Settings, credentials: &Credentials) {
    tracing::info!(
        endpoint = %settings.endpoint,
        telegram_api_url = %settings.telegram_api_url,
        interval_secs = settings.retry_interval_secs,
        request_timeout_secs = ?settings.request_timeout_secs,
        chat_id = %credentials.telegram_chat_id,
        "Configuration loaded"
    );
}
