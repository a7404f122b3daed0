//! PDF page rasterization.
//!
//! Pages with no embedded text are rendered to a bitmap before OCR, so
//! vector-drawn and outlined-glyph pages can be read too. Rendering needs
//! the `render` feature and a pdfium library at runtime; without either,
//! the PDF strategy OCRs the page's embedded images instead.

use std::sync::Arc;

use image::DynamicImage;
#[cfg(not(feature = "render"))]
use tracing::debug;
#[cfg(feature = "render")]
use tracing::{info, warn};

use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Draws PDF pages as bitmaps.
pub trait PageRenderer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Render the given pages (1-indexed) of `data`, in the order asked for.
    fn render_pages(&self, data: &[u8], pages: &[u32]) -> Result<Vec<DynamicImage>, PdfError>;
}

/// The renderer this build and machine can offer, if any.
pub fn default_renderer(config: &PdfConfig) -> Option<Arc<dyn PageRenderer>> {
    if !config.render_pages {
        return None;
    }

    #[cfg(feature = "render")]
    {
        match pdfium::PdfiumRenderer::bind(config) {
            Ok(renderer) => {
                info!("Rendering text-less PDF pages with pdfium");
                return Some(Arc::new(renderer));
            }
            Err(e) => warn!("pdfium unavailable, OCR will use embedded page images: {}", e),
        }
    }

    #[cfg(not(feature = "render"))]
    debug!("Built without the render feature, PDF pages will not be rendered");

    None
}

#[cfg(feature = "render")]
mod pdfium {
    use std::path::PathBuf;

    use image::{DynamicImage, RgbaImage};
    use pdfium_render::prelude::*;
    use tracing::debug;

    use super::PageRenderer;
    use crate::error::PdfError;
    use crate::models::config::PdfConfig;

    fn render_error(e: PdfiumError) -> PdfError {
        PdfError::Render(e.to_string())
    }

    /// Renders through the pdfium C library, bound per document.
    pub struct PdfiumRenderer {
        library_dir: Option<PathBuf>,
        target_width: i32,
    }

    impl PdfiumRenderer {
        /// Check that pdfium can be loaded from the configured place.
        pub fn bind(config: &PdfConfig) -> Result<Self, PdfError> {
            let renderer = Self {
                library_dir: config.pdfium_library_dir.clone(),
                target_width: i32::try_from(config.render_width).unwrap_or(i32::MAX),
            };
            renderer.bindings()?;
            Ok(renderer)
        }

        fn bindings(&self) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
            match &self.library_dir {
                Some(dir) => {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                }
                None => Pdfium::bind_to_system_library(),
            }
            .map_err(render_error)
        }
    }

    impl PageRenderer for PdfiumRenderer {
        fn name(&self) -> &str {
            "pdfium"
        }

        fn render_pages(&self, data: &[u8], pages: &[u32]) -> Result<Vec<DynamicImage>, PdfError> {
            let pdfium = Pdfium::new(self.bindings()?);
            let document = pdfium
                .load_pdf_from_byte_slice(data, None)
                .map_err(render_error)?;
            let render_config = PdfRenderConfig::new().set_target_width(self.target_width);

            pages
                .iter()
                .map(|&page| {
                    let index = page
                        .checked_sub(1)
                        .and_then(|i| u16::try_from(i).ok())
                        .ok_or(PdfError::InvalidPage(page))?;
                    let bitmap = document
                        .pages()
                        .get(index)
                        .map_err(render_error)?
                        .render_with_config(&render_config)
                        .map_err(render_error)?;

                    let (width, height) = (bitmap.width() as u32, bitmap.height() as u32);
                    debug!("Rendered page {} at {}x{}", page, width, height);
                    RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes())
                        .map(DynamicImage::ImageRgba8)
                        .ok_or_else(|| PdfError::Render(format!("page {page}: bad bitmap size")))
                })
                .collect()
        }
    }
}
