use std::path::PathBuf;

use db::DBService;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path: PathBuf = std::env::var("WONIUNOTE_DB_PATH")
        .unwrap_or_else(|_| "woniunote.db".to_string())
        .into();
    let db = DBService::new(&db_path).await?;

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "woniunote server listening");

    axum::serve(listener, server::app(db)).await?;
    Ok(())
}
