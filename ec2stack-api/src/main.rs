use anyhow::Result;
use ec2stack_api::{create_app, AppState, Config};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("ec2stack_api=debug,ec2stack_cloudstack=debug,tower_http=debug")
        .init();

    info!("Starting ec2stack-api service...");

    // Load configuration
    let config = Config::from_env();
    info!(
        "Configuration loaded: bind_addr={}, api_version={}, credentials={}, sandbox_volumes={}",
        config.bind_addr,
        config.api_version,
        config.credentials.len(),
        config.sandbox_volumes.len()
    );
    if config.credentials.is_empty() {
        warn!("No credentials configured; every request will fail authentication");
    }

    let bind_addr = config.bind_addr.clone();
    let app = create_app(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
