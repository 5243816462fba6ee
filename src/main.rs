use anyhow::Result;
use cv_site::config::Config;
use cv_site::cv::CvStore;
use cv_site::db::Database;
use cv_site::server::{build_router, AppState};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cv_site=info".parse()?),
        )
        .init();

    info!("Starting CV site");

    // Load configuration from environment
    let config = Config::from_env()?;
    let port = config.port;

    // Open the visit store
    if let Some(parent) = Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(&config.database_path)?;

    // Load CV content for every supported locale
    let cv = CvStore::load(Path::new(&config.content_dir))?;

    let state = AppState::new(config, db, cv);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
