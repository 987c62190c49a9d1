//! Shelfwatch main entry point
//!
//! Wires the configuration, store, render backend, and notification
//! transport together, then hands control to the watch loop.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use shelfwatch::config::{load_config_with_hash, Config};
use shelfwatch::crawler::{build_http_client, run_watch_loop, Coordinator, HttpRenderer};
use shelfwatch::notify::{dispatch_alerts, AlertMessage, Notifier, WebhookNotifier};
use shelfwatch::storage::SqliteStorage;

/// Shelfwatch: a catalog restock watcher
///
/// Polls a paginated product catalog on an interval, diffs it against the
/// last observed state, and posts restock / new-listing alerts to a chat
/// channel.
#[derive(Parser, Debug)]
#[command(name = "shelfwatch")]
#[command(version)]
#[command(about = "Catalog restock watcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Post alerts to the test channel instead of the production channel
    #[arg(long)]
    test: bool,

    /// Run a single crawl cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let channel_id = if cli.test {
        config
            .notify
            .test_channel_id
            .clone()
            .context("--test requires notify.test-channel-id in the configuration")?
    } else {
        config.notify.channel_id.clone()
    };
    tracing::info!("Running in {} mode", if cli.test { "test" } else { "prod" });

    let store = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("failed to open database")?;

    let client = build_http_client(&format!("shelfwatch/{}", env!("CARGO_PKG_VERSION")))
        .context("failed to build HTTP client")?;
    let notifier = WebhookNotifier::new(client.clone(), config.notify.endpoint.clone());
    let mut page = HttpRenderer::new(client);

    let mut coordinator = Coordinator::new(&config, store)?;

    if !cli.test {
        send_startup_status(&notifier, &config).await;
    }

    if cli.once {
        let alerts = coordinator.run_cycle(&mut page).await?;
        tracing::info!("Alerts to send: {}", alerts.len());
        dispatch_alerts(&notifier, &channel_id, &alerts).await;
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; shutting down after the current cycle");
            signal_cancel.cancel();
        }
    });

    run_watch_loop(
        &mut coordinator,
        &mut page,
        &notifier,
        &channel_id,
        &config.schedule,
        cancel,
    )
    .await;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelfwatch=info,warn"),
            1 => EnvFilter::new("shelfwatch=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// One-shot "watcher online" status to the test channel, if configured.
///
/// Failure is logged and never fatal; the watch proceeds either way.
async fn send_startup_status(notifier: &WebhookNotifier, config: &Config) {
    let Some(test_channel) = &config.notify.test_channel_id else {
        return;
    };

    let message = AlertMessage {
        text: "shelfwatch online".to_string(),
        title: "shelfwatch".to_string(),
        url: config.catalog.base_url.clone(),
    };

    if let Err(e) = notifier.send(test_channel, &message).await {
        tracing::error!("Error sending startup status: {}", e);
    }
}
