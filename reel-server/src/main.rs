use anyhow::Result;
use reel_server::ServerSettings;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = reel_server::config::load();
    let settings = ServerSettings::from_config(&config.snapshot())?;
    let app = reel_server::build(&settings).await?;

    app.listen(settings.addr(), shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested, draining connections"),
        Err(e) => {
            warn!(error = %e, "failed to listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
