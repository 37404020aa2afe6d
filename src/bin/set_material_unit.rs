use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use leafplate_api::{config, db, services::materials::MaterialService};

/// Sets the unit of an existing material, e.g. `set-material-unit ใบตองตึง ใบ`
#[derive(Parser)]
#[command(name = "set-material-unit", version)]
struct Args {
    /// Material name, matched exactly
    name: String,
    /// New unit label
    unit: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await?;
    }
    let pool = Arc::new(pool);

    let service = MaterialService::new(pool, cfg.default_material_unit.clone());
    let material = service.update_unit(&args.name, &args.unit).await?;

    println!("{}: unit set to {}", material.name, material.unit);
    Ok(())
}
