//! CLI command definitions for the `caradvisor` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a verb-noun
//! pattern (e.g., `caradvisor cars list`).

pub mod cars;
pub mod check;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::http::extractors::query::CarListQuery;

/// Conversational car recommendation backend.
#[derive(Parser)]
#[command(name = "caradvisor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (missing file means defaults).
    #[arg(long, global = true, default_value = "caradvisor.toml", env = "CARADVISOR_CONFIG")]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides configuration).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides configuration).
        #[arg(long)]
        host: Option<String>,
    },

    /// Check catalog connectivity and configuration.
    Check,

    /// Browse the car catalog.
    Cars {
        #[command(subcommand)]
        action: CarsCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CarsCommand {
    /// List cars, optionally filtered.
    #[command(alias = "ls")]
    List(CarFilterArgs),
}

/// Filters accepted by `cars list`; same names as the `GET /cars` parameters.
#[derive(Args, Debug, Default)]
pub struct CarFilterArgs {
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub fuel_type: Option<String>,
    #[arg(long)]
    pub transmission: Option<String>,
    #[arg(long)]
    pub min_price: Option<f64>,
    #[arg(long)]
    pub max_price: Option<f64>,
    #[arg(long)]
    pub min_seats: Option<i32>,
    #[arg(long)]
    pub min_year: Option<i32>,
    #[arg(long)]
    pub max_year: Option<i32>,
}

impl From<CarFilterArgs> for CarListQuery {
    fn from(args: CarFilterArgs) -> Self {
        Self {
            brand: args.brand,
            model: args.model,
            color: args.color,
            fuel_type: args.fuel_type,
            transmission: args.transmission,
            min_price: args.min_price,
            max_price: args.max_price,
            min_seats: args.min_seats,
            min_year: args.min_year,
            max_year: args.max_year,
        }
    }
}
