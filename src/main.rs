use std::path::PathBuf;

use clap::Parser;
use gateway_core::Config;
use tracing_subscriber::EnvFilter;

/// Single-user, loopback-only OpenAI-compatible gateway in front of
/// Anthropic's Messages API, authenticated via the Claude Code OAuth client.
#[derive(Parser, Debug)]
#[command(name = "anthropic-oauth-proxy")]
struct Cli {
    /// Override the listen port (also settable via PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file (default: ~/.anthropic-oauth-proxy/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load(Some(&config_path))?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(port = config.port, "starting anthropic-oauth-proxy");
    gateway_server::start(config).await?;
    tracing::info!("anthropic-oauth-proxy shut down");

    Ok(())
}

fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".anthropic-oauth-proxy/config.toml")
}
