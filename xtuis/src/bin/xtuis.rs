use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xtuis::Client;
use xtuis::ClientConfig;
use xtuis::Payload;

/// Send a message through the xtuis push service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Push token
    #[arg(long, env = "XTUIS_TOKEN", hide_env_values = true)]
    token: String,

    /// YAML client configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured push server
    #[arg(long)]
    server_url: Option<String>,

    /// Override the configured request timeout (e.g. "5s")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Message title
    text: String,

    /// Message body
    #[arg(long)]
    desp: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(server_url) = args.server_url {
        config.server_url = server_url;
    }

    let mut builder = Client::builder(args.token)
        .server_url(config.server_url.clone())
        .timeout(config.timeout())
        .limits(config.limiter_set().into());
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;
    info!(server_url = %config.server_url, "client ready");

    let mut payload = Payload::new(args.text);
    if let Some(desp) = args.desp {
        payload = payload.with_desp(desp);
    }

    client.send(&payload).await?;
    Ok(())
}
