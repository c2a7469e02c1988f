use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use petition_relay::clock::IntervalClock;
use petition_relay::config::Config;
use petition_relay::scheduler::Scheduler;
use petition_relay::sink::WebhookSink;
use petition_relay::sources::http::HttpCountFetcher;
use petition_relay::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "petition-relay")]
#[command(about = "Keeps webhook messages in sync with live petition signature counts")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where message ids are persisted
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Webhook to post to
    #[arg(long, env = "PETITION_RELAY_WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Option<String>,

    /// Seconds between update cycles
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(state) = cli.state {
        config.state_file = state;
    }
    if let Some(url) = cli.webhook_url {
        config.webhook.url = url;
    }
    if let Some(secs) = cli.interval {
        config.poll_interval_secs = secs;
    }
    config.validate()?;

    info!(
        state_file = %config.state_file.display(),
        interval_secs = config.poll_interval_secs,
        "starting petition relay"
    );

    let mut scheduler = Scheduler::new(
        config.sources(),
        HttpCountFetcher::new(),
        WebhookSink::new(config.webhook.url.trim()),
        JsonFileStore::new(&config.state_file),
        IntervalClock::new(config.poll_interval()),
    );

    scheduler.run().await
}
