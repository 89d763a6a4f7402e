use std::net::SocketAddr;

use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::{set_diagnostic_errors, StartupError};
use crate::routes;
use crate::state::ServerState;
use service::{jobs, runtime};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &configs::ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address {}:{}: {e}", cfg.host, cfg.port)))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = configs::AppConfig::load_or_env()?;
    set_diagnostic_errors(cfg.server.diagnostic_errors);
    if !cfg.admin.is_enabled() {
        warn!(event = "admin_disabled", "admin.password not set; admin login disabled");
    }

    runtime::ensure_env(&cfg.uploads.root)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    // DB connection
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        migration::Migrator::up(&db, None).await?;
        info!(event = "migrations_applied", "database schema up to date");
    }

    // 后台任务：每日提醒与月度报告
    if cfg.jobs.enabled {
        let notifier = jobs::notifier::from_config(&cfg.jobs)?;
        let handles = jobs::Scheduler::new(db.clone(), notifier, cfg.jobs.clone()).spawn();
        info!(event = "scheduler_started", tasks = handles.len(), "background jobs scheduled");
    }

    let state = ServerState::new(db, &cfg);
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
