//! insurance-stats CLI: query, outlier report and health check over a dataset file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use insurance_stats::data::loader;
use insurance_stats::{Error, OutlierMethod, QueryParams, Service, Settings, Sex, Smoker};

#[derive(Parser)]
#[command(name = "insurance-stats")]
#[command(about = "Query and outlier analysis for medical insurance costs", long_about = None)]
struct Cli {
    /// Dataset file (overrides INSURANCE_STATS_DATA)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter records and summarize charges
    Query {
        /// Minimum age (inclusive)
        #[arg(long)]
        min_age: Option<u32>,

        /// Maximum age (inclusive)
        #[arg(long)]
        max_age: Option<u32>,

        /// male | female
        #[arg(long)]
        sex: Option<Sex>,

        /// yes | no
        #[arg(long)]
        smoker: Option<Smoker>,

        /// Region name, case-insensitive
        #[arg(long)]
        region: Option<String>,
    },

    /// Outlier report over every numeric column
    Report {
        /// iqr | zscore
        #[arg(long, default_value = "iqr")]
        method: OutlierMethod,

        /// Positive threshold (defaults to 1.5 for iqr, 3 for zscore)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Descriptive statistics for every numeric column
    Describe,

    /// Whether the dataset is loaded and how many rows it has
    Health,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(path) = cli.data {
        settings.data_path = path;
    }

    let dataset = loader::load_or_empty(&settings.data_path);
    let service = Service::new(dataset, settings);

    let outcome = match cli.command {
        Commands::Query {
            min_age,
            max_age,
            sex,
            smoker,
            region,
        } => {
            let params = QueryParams {
                min_age,
                max_age,
                sex,
                smoker,
                region,
            };
            service.query(&params).and_then(|r| print_json(&r))
        }
        Commands::Report { method, threshold } => service
            .report(method, threshold)
            .and_then(|r| print_json(&r)),
        Commands::Describe => service.describe().and_then(|r| print_json(&r)),
        Commands::Health => print_json(&service.health()),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Integrity(format!("serializing output: {e}")))?;
    println!("{text}");
    Ok(())
}
