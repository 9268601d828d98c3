mod api;
mod middleware;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use caregrid_search::{EngineConfig, MatchPolicy};

use crate::api::{build_app, default_rate_limit_state, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = caregrid_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(?config, "starting caregrid-server");

    let pool_config = caregrid_db::PoolConfig::from(&config);
    let pool = caregrid_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = caregrid_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let engine_config = EngineConfig {
        ingested_timeout: Duration::from_millis(config.ingested_fetch_timeout_ms),
        deadline: (config.search_deadline_ms > 0)
            .then(|| Duration::from_millis(config.search_deadline_ms)),
        match_policy: MatchPolicy::default(),
    };
    let app = build_app(
        AppState::new(pool, engine_config),
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
