use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use webpos_gateway::config::Config;
use webpos_gateway::ports::OrderGateway;
use webpos_gateway::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Admin-notice equivalent: the gateway stays enabled, initiations
    // will fail until credentials are configured.
    if !config.gateway.is_configured() {
        tracing::warn!(
            "processor credentials missing; set WEBPOS_CLIENT_ID and WEBPOS_CLIENT_SECRET"
        );
    }

    let pool = db::create_pool(&config.database_url).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let orders: Arc<dyn OrderGateway> = Arc::new(db::PgOrderGateway::new(pool));
    let state = AppState::new(&config, orders)?;
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
