//! Admin Server - HTTP API for the admin and KOL dashboards
//!
//! Usage:
//!   cargo run --release --bin admin_server
//!
//! Environment variables:
//!   MINEPATH_DB_PATH - SQLite database path (default: minepath.db)
//!   MINEPATH_SCHEMA_DIR - Directory of ordered .sql schema files (default: sql)
//!   ADMIN_BIND_ADDR - Listen address (default: 0.0.0.0:3000)
//!   DEFAULT_PAGE_LIMIT / MAX_PAGE_LIMIT - Listing page sizes (default: 10 / 100)
//!   ENABLE_CORS - Permissive CORS layer (default: false)
//!   RUST_LOG - Logging level (optional, default: info)

use dotenv::dotenv;
use log::info;
use minepath_admin::config::AdminConfig;
use minepath_admin::gateway::{run_schema_migrations, SqliteGateway};
use minepath_admin::http::{router, AppState};
use rusqlite::Connection;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("🚀 MinePath Admin Server");

    let config = AdminConfig::from_env();
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Schema dir: {}", config.schema_dir);
    info!("   ├─ Bind: {}", config.bind_addr);
    info!(
        "   ├─ Page limit: {} (max {})",
        config.default_page_limit, config.max_page_limit
    );
    info!("   └─ CORS: {}", if config.enable_cors { "enabled" } else { "disabled" });

    info!("🔧 Initializing database...");
    let mut conn = Connection::open(&config.db_path)?;
    run_schema_migrations(&mut conn, &config.schema_dir)?;
    drop(conn);

    let store = SqliteGateway::open(&config.db_path)?;
    info!("✅ Database initialized");

    let bind_addr = config.bind_addr.clone();
    let app = router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("✅ Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for shutdown signal: {}", e);
            }
            info!("🛑 Shutdown requested");
        })
        .await?;

    Ok(())
}
