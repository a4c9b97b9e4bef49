//! Parcel tracker demonstration binary.
//!
//! Runs a fixed sequence against the configured database: register a parcel,
//! redirect it, send it, try to delete it, then register and delete a second one,
//! printing the client's parcels between steps.
//!
//! # Usage
//!
//! ```bash
//! parcel-tracker --db-path data/tracker.db
//! PARCEL_TRACKER_IN_MEMORY=true parcel-tracker --log-format json
//! ```

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use futures::executor::block_on;
use parcel_tracker::config::{Config, LogFormat};
use parcel_tracker::{demo, ParcelService, SqliteParcelStore};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(&config);

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %format!("{err:#}"), "cannot open parcel storage");
            return ExitCode::FAILURE;
        }
    };
    let service = ParcelService::new(store);

    let outcome = block_on(demo::run(&service, &config, |report| println!("{report}")));
    if let Err(err) = service.into_store().close() {
        warn!(error = %err, "closing parcel storage failed");
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = anyhow::Error::from(err);
            error!(error = %format!("{err:#}"), "demonstration stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let use_json = match config.log_format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    // Logs go to stderr; stdout carries the client reports.
    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_store(config: &Config) -> Result<SqliteParcelStore> {
    if config.in_memory {
        return SqliteParcelStore::open_in_memory().context("open in-memory database");
    }

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    info!(path = %config.db_path.display(), "opening parcel storage");
    SqliteParcelStore::open(&config.db_path)
        .with_context(|| format!("open database {}", config.db_path.display()))
}
