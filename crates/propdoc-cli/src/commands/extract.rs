//! Extract command - print a document's text without calling the reasoning service.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use super::{load_config, read_input, text_extractor};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PNG, JPEG, HEIC, PDF or DOCX)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let (bytes, filename) = read_input(&args.input)?;

    let extractor = text_extractor(&config);
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &filename))
        .await?
        .map_err(|e| anyhow::anyhow!("could not read document: {}", e))?;

    info!("Extracted {} characters in {:?}", text.len(), start.elapsed());

    if let Some(output_path) = &args.output {
        fs::write(output_path, &text)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}
