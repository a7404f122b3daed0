//! CLI subcommands.

pub mod classify;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod models;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use propdoc_core::models::config::PropdocConfig;
use propdoc_core::{ocr, OpenAiService, StructuredExtractor, TextExtractor};

/// Platform configuration file, e.g. `~/.config/propdoc/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("propdoc")
        .join("config.json")
}

/// Configuration from `--config`, else the platform file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PropdocConfig> {
    if let Some(path) = config_path {
        return Ok(PropdocConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(PropdocConfig::from_file(&default_path)?)
    } else {
        Ok(PropdocConfig::default())
    }
}

pub fn text_extractor(config: &PropdocConfig) -> TextExtractor {
    TextExtractor::new(ocr::shared(&config.ocr), config.pdf.clone())
}

pub fn structured_extractor(config: &PropdocConfig) -> anyhow::Result<StructuredExtractor> {
    let service = OpenAiService::from_config(&config.reasoning)?;
    Ok(StructuredExtractor::new(Arc::new(service)))
}

/// Read an input file, failing with its path when missing.
pub fn read_input(path: &Path) -> anyhow::Result<(Vec<u8>, String)> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok((bytes, filename))
}
