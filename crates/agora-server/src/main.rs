use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_api::{AppState, AppStateInner};
use agora_db::Database;

struct Config {
    db_path: PathBuf,
    addr: SocketAddr,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let db_path = std::env::var("AGORA_DB_PATH").unwrap_or_else(|_| "agora.db".into());
        let host = std::env::var("AGORA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("AGORA_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;

        Ok(Self {
            db_path: PathBuf::from(db_path),
            addr: format!("{}:{}", host, port).parse()?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agora=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    // Every concept is built once here and shared by all handlers
    let state: AppState = Arc::new(AppStateInner::new(db));

    let app = agora_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Agora server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
