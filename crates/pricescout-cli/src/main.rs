mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricescout-cli")]
#[command(about = "Compare product prices across marketplaces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every marketplace of a region and print offers cheapest first
    Search {
        /// Product to look for
        query: String,

        /// Region code (us, tr, eu)
        #[arg(long, short, default_value = "us")]
        region: String,

        #[arg(long, short = 'n', default_value_t = 5)]
        max_results: usize,

        /// Only query these platform ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<String>,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List supported regions and their platforms
    Regions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = pricescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            query,
            region,
            max_results,
            platforms,
            json,
        } => {
            let args = search::SearchArgs {
                query,
                region,
                max_results,
                platforms,
                json,
            };
            search::run_search(&config, args).await
        }
        Commands::Regions => search::run_regions(&config),
    }
}

#[cfg(test)]
mod tests;
