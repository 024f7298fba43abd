//! KOL Report - downstream volume per manager, printed as JSON
//!
//! Usage:
//!   cargo run --release --bin kol_report -- [--role KOL|BD] [--method MINING[,CLAIM...]]
//!
//! Defaults to the KOL cohort and MINING volume. Prints one JSON document with
//! every manager's downstream size and SOL volume, plus the top performer by
//! volume and by referrals.
//!
//! Environment variables:
//!   MINEPATH_DB_PATH - SQLite database path (default: minepath.db)
//!   RUST_LOG - Logging level (optional, default: info)

use dotenv::dotenv;
use log::info;
use minepath_admin::config::AdminConfig;
use minepath_admin::gateway::{SqliteGateway, TransactionFilter};
use minepath_admin::model::Role;
use minepath_admin::reporting::{mining_volume_filter, PerformerMetric, ReportingFacade};
use std::env;
use std::sync::Arc;

fn arg_value(name: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|x| x == name)
        .and_then(|idx| args.get(idx + 1).cloned())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AdminConfig::from_env();
    let role: Role = arg_value("--role").as_deref().unwrap_or("KOL").parse()?;
    let filter = match arg_value("--method") {
        Some(methods) => TransactionFilter::parse(Some(&methods), None, None)?,
        None => mining_volume_filter(),
    };

    info!("📊 KOL Report");
    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Cohort: {}", role);
    info!("   └─ Methods: {:?}", filter.methods());

    let store = SqliteGateway::open_with_embedded_schema(&config.db_path)?;
    let facade = ReportingFacade::new(Arc::new(store));

    let managers = facade.cohort_volumes(role, &filter).await?;
    let top_by_volume = facade.get_top_performer(role, PerformerMetric::Volume).await?;
    let top_by_referrals = facade.get_top_performer(role, PerformerMetric::Referrals).await?;

    info!("✅ {} managers aggregated", managers.len());

    let report = serde_json::json!({
        "role": role,
        "managers": managers,
        "topByVolume": top_by_volume,
        "topByReferrals": top_by_referrals,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
