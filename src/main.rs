use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ital::models::Granularity;

#[derive(Parser)]
#[command(
    name = "ital",
    version,
    about = "Churn-rate comparison dashboard with period alignment and AI reporting",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a worksheet and print the extracted dataset
    Fetch {
        /// Calendar granularity (week, month)
        #[arg(short, long, default_value = "week")]
        granularity: Granularity,
    },

    /// Compare one metric between two years
    Compare {
        /// Funnel-stage column to compare
        #[arg(short, long)]
        metric: String,

        /// Reference (earlier) year
        #[arg(long)]
        year1: i32,

        /// Current year (defaults to this calendar year)
        #[arg(long)]
        year2: Option<i32>,

        /// Calendar granularity (week, month)
        #[arg(short, long, default_value = "week")]
        granularity: Granularity,
    },

    /// Generate the AI narrative report for the full dataset
    Report {
        /// Calendar granularity (week, month)
        #[arg(short, long, default_value = "week")]
        granularity: Granularity,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the dashboard API server
    Serve {
        /// Bind host (overrides ITAL_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides ITAL_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, &cli.log_format)?;

    match cli.command {
        Commands::Fetch { granularity } => ital::commands::fetch(granularity).await,
        Commands::Compare {
            metric,
            year1,
            year2,
            granularity,
        } => ital::commands::compare(granularity, metric, year1, year2).await,
        Commands::Report {
            granularity,
            output,
        } => ital::commands::report(granularity, output).await,
        Commands::Serve { host, port } => ital::commands::serve(host, port).await,
    }
}

fn init_logging(verbose: bool, format: &str) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
