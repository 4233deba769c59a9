use std::sync::Arc;

use userman_api::app;
use userman_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    userman_observability::init();

    let config = Config::load()?;
    let services = Arc::new(app::services::build_services(&config).await?);
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
