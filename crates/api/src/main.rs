use anyhow::Context;

use appvault_api::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    appvault_observability::init();

    // No signing secret, no server.
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return Err(e.into());
        }
    };

    let app = appvault_api::app::build_app(&config).context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
