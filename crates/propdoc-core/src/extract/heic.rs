//! HEIC strategy, decoded through libheif when the `heic` feature is enabled.

use crate::error::ExtractionError;
use crate::ocr::OcrEngines;

#[cfg(feature = "heic")]
pub fn extract_text(bytes: &[u8], ocr: &OcrEngines) -> Result<String, ExtractionError> {
    let image = decode(bytes)?;
    tracing::debug!("Decoded HEIC {}x{}", image.width(), image.height());

    Ok(ocr.recognize(&image)?.trim().to_string())
}

#[cfg(not(feature = "heic"))]
pub fn extract_text(_bytes: &[u8], _ocr: &OcrEngines) -> Result<String, ExtractionError> {
    tracing::warn!("HEIC support is not compiled in, enable the `heic` feature");
    Err(ExtractionError::UnsupportedFormat("heic".to_string()))
}

#[cfg(feature = "heic")]
fn decode(bytes: &[u8]) -> Result<image::DynamicImage, ExtractionError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |e: libheif_rs::HeifError| ExtractionError::Decode(format!("HEIC: {}", e));

    let lib_heif = LibHeif::new();
    let context = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
    let handle = context.primary_image_handle().map_err(heif_err)?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ExtractionError::Decode("HEIC: no interleaved plane".to_string()))?;

    let (width, height, stride) = (plane.width, plane.height, plane.stride);
    let row_len = width as usize * 3;
    let mut rgb = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(stride).take(height as usize) {
        rgb.extend_from_slice(&row[..row_len.min(row.len())]);
    }

    image::RgbImage::from_raw(width, height, rgb)
        .map(image::DynamicImage::ImageRgb8)
        .ok_or_else(|| ExtractionError::Decode("HEIC: truncated pixel data".to_string()))
}

#[cfg(all(test, not(feature = "heic")))]
mod tests {
    use super::*;

    #[test]
    fn test_heic_without_feature_is_unsupported() {
        let ocr = OcrEngines::none();
        assert!(matches!(
            extract_text(b"ftypheic", &ocr),
            Err(ExtractionError::UnsupportedFormat(format)) if format == "heic"
        ));
    }
}
