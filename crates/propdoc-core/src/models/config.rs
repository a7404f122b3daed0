//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the propdoc pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropdocConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Reasoning service configuration.
    pub reasoning: ReasoningConfig,

    /// Database configuration.
    pub database: DatabaseConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory with the primary engine's model files.
    pub model_dir: PathBuf,

    /// Directory with the secondary engine's model files, if any.
    pub fallback_model_dir: Option<PathBuf>,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Maximum image dimension (longer side) for processing.
    pub max_image_size: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/primary"),
            fallback_model_dir: None,
            keep_unk: false,
            max_image_size: 2048,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Run OCR on pages that carry no embedded text.
    pub ocr_fallback: bool,

    /// Rasterize text-less pages for OCR when a renderer is available.
    pub render_pages: bool,

    /// Width in pixels of rendered pages.
    pub render_width: u32,

    /// Directory holding the pdfium library. The system library is used when unset.
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            ocr_fallback: true,
            render_pages: true,
            render_width: 2000,
            pdfium_library_dir: None,
        }
    }
}

/// Reasoning service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL. `DATABASE_URL` takes precedence when set.
    pub url: String,

    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:propdoc.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection URL, preferring the environment.
    pub fn effective_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.url.clone())
    }
}

impl PropdocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
