//! CLI application for property document ingestion.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{classify, config, extract, ingest, models};

/// Property documents in, structured records out
#[derive(Parser)]
#[command(name = "propdoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a lease, invoice or contract and store it
    Ingest(ingest::IngestArgs),

    /// Determine whether a document is a lease, invoice or contract
    Classify(classify::ClassifyArgs),

    /// Print the text extracted from a document
    Extract(extract::ExtractArgs),

    /// Manage OCR models
    Models(models::ModelsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ingest(args) => ingest::run(args, config_path).await,
        Commands::Classify(args) => classify::run(args, config_path).await,
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Models(args) => models::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
