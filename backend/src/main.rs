//! Backend entry-point: loads settings, prepares storage and serves the REST
//! API with its OpenAPI docs.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reciclai::domain::PointsAward;
use reciclai::inbound::http::health::HealthState;
use reciclai::inbound::http::session_config::{BuildMode, session_settings};
use reciclai::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let session = session_settings(&settings.session_toggles(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let award = PointsAward::new(settings.award_points())
        .map_err(|e| std::io::Error::other(format!("invalid award_points: {e}")))?;

    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr()?,
    )
    .with_award(award);
    let config = match settings.database_url.as_deref() {
        Some(database_url) => config.with_db_pool(connect(database_url, &settings).await?),
        None => {
            warn!("database_url not set; using the in-memory store");
            config
        }
    };

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!("server started");
    let result = server.await;
    health_state.mark_unhealthy();
    result
}

/// Apply migrations and open the connection pool.
async fn connect(database_url: &str, settings: &AppSettings) -> std::io::Result<DbPool> {
    run_migrations(database_url)
        .await
        .map_err(std::io::Error::other)?;
    DbPool::new(PoolConfig::new(database_url).with_max_size(settings.db_pool_size()))
        .await
        .map_err(std::io::Error::other)
}
