//! Command-line and environment configuration for the `parcel-tracker` binary.
//!
//! Every flag can also be set through a `PARCEL_TRACKER_*` environment variable;
//! flags win over the environment, the environment wins over defaults.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
    /// JSON when stdout is not a terminal, text otherwise.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "parcel-tracker", version, about = "Parcel tracking demo over SQLite")]
pub struct Config {
    /// SQLite database file. Parent directories are created if missing.
    #[arg(long, env = "PARCEL_TRACKER_DB_PATH", default_value = "data/tracker.db")]
    pub db_path: PathBuf,

    /// Use a throwaway in-memory database instead of `db_path`.
    #[arg(long, env = "PARCEL_TRACKER_IN_MEMORY")]
    pub in_memory: bool,

    /// Client the demonstration registers parcels for.
    #[arg(long, env = "PARCEL_TRACKER_CLIENT_ID", default_value_t = 1)]
    pub client_id: i64,

    /// Address the demo parcels are registered with.
    #[arg(
        long,
        env = "PARCEL_TRACKER_ADDRESS",
        default_value = "Pskov, Pushkin village, Kolotushkina st. 5"
    )]
    pub address: String,

    /// Address the first demo parcel is redirected to.
    #[arg(
        long,
        env = "PARCEL_TRACKER_NEW_ADDRESS",
        default_value = "Saratov, Verkhnie Zori village, Kozlova st. 25"
    )]
    pub new_address: String,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "PARCEL_TRACKER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "PARCEL_TRACKER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Auto)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/tracker.db"),
            in_memory: false,
            client_id: 1,
            address: "Pskov, Pushkin village, Kolotushkina st. 5".to_string(),
            new_address: "Saratov, Verkhnie Zori village, Kozlova st. 25".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Auto,
        }
    }
}
