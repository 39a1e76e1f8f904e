//! Moca-Chain dev node: builds the container, seeds genesis defaults
//! and ticks empty blocks. The consensus engine drives `run_block` in
//! production; this loop stands in for it during development.

use node_runtime::{App, AppConfig, GenesisBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::default();
    let app = App::new(config)?;
    GenesisBuilder::new().apply(&app);
    info!("moca-node ready");

    let mut height: u64 = 1;
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                app.run_block(height, now, |_ctx| {});
                height += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                info!(height, "shutting down");
                break;
            }
        }
    }
    Ok(())
}
