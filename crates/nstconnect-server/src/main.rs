use std::sync::Arc;

use tracing::info;

use nstconnect_api::AppStateInner;
use nstconnect_db::Database;
use nstconnect_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    nstconnect_server::init_tracing();

    let config = Config::from_env()?;
    let db = Database::open(&config.db_path)?;

    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl_days: config.token_ttl_days,
    });
    let app = nstconnect_server::app(state);

    let addr = config.bind_addr()?;
    info!("NST Connect API listening on {}", addr);
    info!("Tokens expire after {} days", config.token_ttl_days);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(nstconnect_server::shutdown_signal())
        .await?;

    Ok(())
}
