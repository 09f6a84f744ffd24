//! CLI configuration

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use seatwise::switching::SwitchingPolicy;
use thiserror::Error;

use crate::client::DataServiceConfig;

/// Errors raised while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The absence status is not a valid HTTP status code.
    #[error("invalid absence status: {0}")]
    AbsenceStatus(u16),
}

/// Seatwise CLI configuration
#[derive(Debug, Parser)]
#[command(name = "seatwise", about = "License consolidation savings", long_about = None)]
pub struct CliConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Seatwise subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Savings for every cluster in a fixture file.
    Savings(SavingsArgs),

    /// Search clusters on the data service and show their savings.
    Clusters(ClustersArgs),

    /// Assemble one application's per-subsidiary dataset.
    Assemble(AssembleArgs),
}

/// Arguments for `seatwise savings`.
#[derive(Debug, Args)]
pub struct SavingsArgs {
    /// Fixture file describing clusters, offers and the switching policy
    #[arg(long)]
    pub fixture: PathBuf,

    /// Consolidate onto this vendor instead of the first candidate
    #[arg(long)]
    pub vendor: Option<String>,

    /// Currency amounts are shown in
    #[arg(long, default_value = "EUR")]
    pub currency: String,
}

/// Arguments for `seatwise clusters`.
#[derive(Debug, Args)]
pub struct ClustersArgs {
    /// Application name to search for
    #[arg(long)]
    pub app_name: String,

    /// Consolidate onto this vendor instead of the first candidate
    #[arg(long)]
    pub vendor: Option<String>,

    /// Currency amounts are shown in
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    #[command(flatten)]
    pub service: DataServiceArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Arguments for `seatwise assemble`.
#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// Cluster key
    #[arg(long)]
    pub cluster: String,

    /// Application to assemble rows for
    #[arg(long)]
    pub app_id: String,

    /// Subsidiaries to add, in order
    #[arg(long = "add")]
    pub add: Vec<String>,

    /// Subsidiaries to remove after adding, in order
    #[arg(long = "remove")]
    pub remove: Vec<String>,

    /// Summarise against this vendor instead of the first candidate
    #[arg(long)]
    pub vendor: Option<String>,

    /// Currency amounts are shown in
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    #[command(flatten)]
    pub service: DataServiceArgs,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Data service connection settings.
#[derive(Debug, Args)]
pub struct DataServiceArgs {
    /// Data service base URL
    #[arg(long, env = "SEATWISE_API_URL")]
    pub api_url: String,

    /// Detail fetch timeout in milliseconds
    #[arg(long, env = "SEATWISE_FETCH_TIMEOUT_MS", default_value_t = 10_000_u64)]
    pub fetch_timeout_ms: u64,

    /// HTTP status the service uses to report that no data exists
    #[arg(long, env = "SEATWISE_ABSENCE_STATUS", default_value_t = 500_u16)]
    pub absence_status: u16,
}

impl DataServiceArgs {
    /// Client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the absence status is not a valid status code.
    pub fn client_config(&self) -> Result<DataServiceConfig, ConfigError> {
        let absence_status = StatusCode::from_u16(self.absence_status)
            .map_err(|_invalid| ConfigError::AbsenceStatus(self.absence_status))?;

        Ok(DataServiceConfig {
            base_url: self.api_url.clone(),
            absence_status,
        })
    }

    /// Detail fetch deadline.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Switching policy settings.
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Training cost per migrated user
    #[arg(long, env = "SEATWISE_TRAINING_COST_PER_USER", default_value_t = Decimal::ZERO)]
    pub training_cost_per_user: Decimal,

    /// Flat migration cost per cluster
    #[arg(long, env = "SEATWISE_MIGRATION_FLAT_COST", default_value_t = Decimal::ZERO)]
    pub migration_flat_cost: Decimal,

    /// Contract break penalty as a fraction of current yearly spend
    #[arg(long, env = "SEATWISE_PENALTY_RATE", default_value_t = Decimal::ZERO)]
    pub penalty_rate: Decimal,
}

impl From<&PolicyArgs> for SwitchingPolicy {
    fn from(args: &PolicyArgs) -> Self {
        SwitchingPolicy::new(
            args.training_cost_per_user,
            args.migration_flat_cost,
            args.penalty_rate,
        )
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}
