//! Text extraction dispatcher.
//!
//! The file extension selects one [`Format`]; each format has its own
//! strategy for producing plain text. Extraction either returns non-blank
//! text or an [`ExtractionError`], never an empty success.

mod docx;
mod heic;
mod raster;
pub mod pdf;
pub mod render;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::PdfConfig;
use crate::ocr::OcrEngines;
use render::PageRenderer;

/// Source formats with an extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Image,
    Heic,
    Pdf,
    Docx,
}

impl Format {
    /// Select a format from the filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "png" | "jpg" | "jpeg" => Ok(Format::Image),
            "heic" => Ok(Format::Heic),
            "pdf" => Ok(Format::Pdf),
            "docx" => Ok(Format::Docx),
            _ => Err(ExtractionError::UnsupportedFormat(if extension.is_empty() {
                filename.to_string()
            } else {
                format!(".{extension}")
            })),
        }
    }
}

/// Turns uploaded bytes into plain text.
#[derive(Clone)]
pub struct TextExtractor {
    ocr: Arc<OcrEngines>,
    renderer: Option<Arc<dyn PageRenderer>>,
    pdf: PdfConfig,
}

impl TextExtractor {
    /// Uses the default page renderer when this build and machine have one.
    pub fn new(ocr: Arc<OcrEngines>, pdf: PdfConfig) -> Self {
        Self {
            renderer: render::default_renderer(&pdf),
            ocr,
            pdf,
        }
    }

    /// Render text-less PDF pages with `renderer` instead.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Extract text from `bytes`, choosing the strategy from `filename`.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn extract_text(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
        let format = Format::from_filename(filename)?;
        debug!("Extracting {} ({} bytes) as {:?}", filename, bytes.len(), format);

        let text = match format {
            Format::Image => raster::extract_text(bytes, &self.ocr)?,
            Format::Heic => heic::extract_text(bytes, &self.ocr)?,
            Format::Pdf => pdf::extract_text(bytes, &self.ocr, self.renderer.as_deref(), &self.pdf)?,
            Format::Docx => docx::extract_text(bytes)?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(ExtractionError::NoTextExtracted);
        }

        info!("Extracted {} characters from {}", text.len(), filename);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_filename("scan.PNG").unwrap(), Format::Image);
        assert_eq!(Format::from_filename("photo.jpg").unwrap(), Format::Image);
        assert_eq!(Format::from_filename("photo.Jpeg").unwrap(), Format::Image);
        assert_eq!(Format::from_filename("IMG_0001.HEIC").unwrap(), Format::Heic);
        assert_eq!(Format::from_filename("lease.final.pdf").unwrap(), Format::Pdf);
        assert_eq!(Format::from_filename("contract.docx").unwrap(), Format::Docx);
    }

    #[test]
    fn test_unsupported_extensions() {
        for name in ["notes.txt", "sheet.xlsx", "old.doc", "README"] {
            assert!(matches!(
                Format::from_filename(name),
                Err(ExtractionError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_format_skips_ocr() {
        // No engines: any OCR attempt would surface as an OCR error instead.
        let extractor = TextExtractor::new(Arc::new(OcrEngines::none()), PdfConfig::default());
        let err = extractor.extract_text(b"plain text", "notes.txt").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ext) if ext == ".txt"));
    }
}
