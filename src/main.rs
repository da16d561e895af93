//! Bounty Bot server
//!
//! Tracks bounty approvals on a project board and greets first-time
//! contributors.

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bounty_bot::{Config, GitHubClient, HandlerContext, SlackNotifier};

#[derive(Debug, Parser)]
#[command(name = "bounty-bot", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the bind host from the config file
    #[arg(long, env = "BOT_HOST")]
    host: Option<String>,

    /// Override the bind port from the config file
    #[arg(long, env = "BOT_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_from(&args.config)?;

    info!("Starting Bounty Bot as {}", config.bot.login);

    let github = GitHubClient::new();
    let slack = SlackNotifier::new(config.slack_webhook_url());
    if !slack.enabled() {
        warn!("No Slack webhook URL configured, notifications are disabled");
    }

    let ctx = HandlerContext::new(github, slack, config.bot.login.clone());
    if ctx.dry_run {
        warn!("DRY_RUN set: project card mutations are disabled");
    }
    if ctx.dry_run_bounty_approval {
        warn!("DRY_RUN_BOUNTY_APPROVAL set: bounty Slack notifications are disabled");
    }

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    bounty_bot::server::run_server(&host, port, ctx).await
}
