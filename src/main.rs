use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod errors;
mod handlers;
mod models;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // --- Parse config + command; fails before any remote call ---
    let (cfg, command) = config::AppConfig::from_env_and_args()?;
    tracing::debug!("Starting cdn-assets with config: {:?}", cfg);

    // --- Clients for this invocation only ---
    let clients = services::aws::AwsClients::from_settings(&cfg.aws).await;

    let mut ctx = commands::CommandContext::new(&cfg, &clients.s3, &clients.cloudfront);
    if let Err(err) = ctx.run(command).await {
        if let Some(hint) = err.hint() {
            tracing::error!("{}", hint);
        }
        return Err(err.into());
    }

    Ok(())
}
