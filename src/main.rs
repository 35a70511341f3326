//! Address Cleanser - incremental address geocoding ETL
//!
//! Reads source addresses above the last processed key, geocodes each one
//! and appends the normalized (or failed) result to the target table.

mod cli;
mod config;
mod db;
mod services;
mod types;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Instrument};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::repository::{last_processed_key_or_zero, AddressRepository, PgAddressRepository};
use crate::services::dispatcher::Dispatcher;
use crate::services::geocoding::create_geocoder;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "address-cleanser.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,address_cleanser=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let cli = Cli::parse();

    // Missing or malformed configuration is the one fatal error
    let config = Config::load(&cli.config)?;
    info!("Configuration loaded from {}", cli.config.display());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let run_id = Uuid::new_v4();
            run(config)
                .instrument(tracing::info_span!("run", %run_id))
                .await
        }
        Command::Cutoff => print_cutoff(&config).await,
    }
}

/// Fetch the next batch and clean it. Per-row failures never change the result.
async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let pool_size = u32::try_from(config.max_workers).unwrap_or(u32::MAX);

    let source = db::connect(&config.source.server, &config.source.database, pool_size).await;
    let target = db::connect(&config.target.server, &config.target.database, pool_size).await;

    let (Some(source), Some(target)) = (source, target) else {
        println!("Could not get addresses from database: connection failed");
        return Ok(());
    };

    let repository: Arc<dyn AddressRepository> = Arc::new(PgAddressRepository::new(
        source,
        target,
        config.source.table.clone(),
        config.target.table.clone(),
    ));

    let cutoff = repository.last_processed_key().await;
    info!("Resuming after key {}", cutoff);

    let addresses = match repository.fetch_batch(cutoff, config.batch_size).await {
        Ok(addresses) => addresses,
        Err(e) => {
            error!("Could not read address list: {:#}", e);
            println!("Could not get addresses from database: {:#}", e);
            return Ok(());
        }
    };

    if addresses.is_empty() {
        info!("No new addresses after key {}", cutoff);
        return Ok(());
    }

    let geocoder = create_geocoder(&config)?;
    let dispatcher = Arc::new(Dispatcher::new(repository, geocoder, config.max_workers));
    dispatcher.run_batch(addresses).await;

    Ok(())
}

/// Print the key the next run resumes after, 0 when the target cannot be queried
async fn print_cutoff(config: &Config) -> Result<()> {
    let Some(target) = db::connect(&config.target.server, &config.target.database, 1).await else {
        println!("Could not connect to target database");
        return Ok(());
    };

    let cutoff = last_processed_key_or_zero(&target, &config.target.table).await;
    println!("{}", cutoff);
    Ok(())
}
