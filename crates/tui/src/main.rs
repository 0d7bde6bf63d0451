mod app;
mod forms;

use std::fs::{self, OpenOptions};

use anyhow::{Context, Result};
use tracing_subscriber::{prelude::*, EnvFilter};

use ludoteca_core::{config, AppConfig, CatalogStore, RentalLedger};

fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;

    let catalog = CatalogStore::open(config.games_path());
    let ledger = RentalLedger::open(config.rentals_path(), catalog.clone());

    let mut app = app::LudotecaApp::new(catalog, ledger);
    app.run()
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("ludoteca.log");

    let env_filter = EnvFilter::from_default_env();

    // The alternate screen owns stdout, so logs go to the file only.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
