use match_server::config;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();
    if config.reclaim_empty_matches {
        tracing::info!("Empty matches will be reclaimed");
    }

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting match server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    match_server::serve(listener, config).await?;
    Ok(())
}
