//! Raster image strategy.

use tracing::debug;

use crate::error::ExtractionError;
use crate::ocr::OcrEngines;

pub fn extract_text(bytes: &[u8], ocr: &OcrEngines) -> Result<String, ExtractionError> {
    let image = image::load_from_memory(bytes)?;
    debug!("Decoded image {}x{}", image.width(), image.height());

    Ok(ocr.recognize(&image)?.trim().to_string())
}
