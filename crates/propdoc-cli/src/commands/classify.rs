//! Classify command - ask the reasoning service what a document is.

use std::path::PathBuf;

use clap::Args;
use console::style;

use super::{load_config, read_input, structured_extractor, text_extractor};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Input file (PNG, JPEG, HEIC, PDF or DOCX)
    #[arg(required = true)]
    input: PathBuf,
}

pub async fn run(args: ClassifyArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let (bytes, filename) = read_input(&args.input)?;

    let extractor = text_extractor(&config);
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &filename))
        .await??;

    let client = structured_extractor(&config)?;
    match client.determine_document_type(&text).await? {
        Some(kind) => println!("{}", kind),
        None => {
            eprintln!(
                "{} Not a lease, invoice or contract",
                style("ℹ").blue()
            );
            println!("other");
        }
    }

    Ok(())
}
