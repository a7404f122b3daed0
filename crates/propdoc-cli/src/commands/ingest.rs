//! Ingest command - extract, map and store one document.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use propdoc_core::{DocumentKind, IngestRequest, Ingestor, store};

use super::{load_config, read_input, structured_extractor, text_extractor};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Input file (PNG, JPEG, HEIC, PDF or DOCX)
    #[arg(required = true)]
    input: PathBuf,

    /// Declared document type: lease, invoice or contract
    #[arg(short = 't', long = "type")]
    document_type: DocumentKind,

    /// Owner the records are filed under
    #[arg(long)]
    owner: i64,

    /// Existing property; required for invoices and contracts
    #[arg(short, long)]
    property_id: Option<i64>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: IngestArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let (bytes, filename) = read_input(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Ingesting {} as {}...", filename, args.document_type));

    let pool = store::connect(&config.database).await?;
    let ingestor = Ingestor::new(text_extractor(&config), structured_extractor(&config)?, pool);

    let request = IngestRequest {
        bytes,
        filename,
        document_type: args.document_type,
        property_id: args.property_id,
        owner_id: args.owner,
    };

    let json = match ingestor.ingest_json(request).await {
        Ok(json) => {
            pb.finish_and_clear();
            json
        }
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("{} {}", style("✗").red(), style(e.class()).red().bold());
            eprintln!("  stage: {}", e.stage);
            eprintln!("  cause: {}", e.failure);
            anyhow::bail!("ingestion failed at {}", e.stage);
        }
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &json)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", json);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
