//! PDF strategy: embedded text per page, OCR for pages without any.

use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::render::PageRenderer;
use crate::error::{ExtractionError, OcrError, PdfError};
use crate::models::config::PdfConfig;
use crate::ocr::OcrEngines;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Page-level access to a PDF.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract embedded text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Extract the raster images drawn on a page.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;

    /// Text of every page through `pdf-extract`.
    fn extract_pages_text(&self) -> Result<Vec<String>>;
}

/// PDF content extractor using lopdf.
#[derive(Default)]
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|filter| match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            // JPEG streams decode directly from the raw content.
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping unsupported image filter");
                return None;
            }
            _ => {}
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        decode_raw(&data, width, height, color_space)
    }

    /// Resources of a page, walking up the page tree for inherited ones.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res))) = doc.dereference(resources) {
                return Some(res.clone());
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(doc, *parent_id),
            _ => None,
        }
    }
}

/// Decode uncompressed 8-bit RGB or gray samples.
fn decode_raw(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Owner-password-only PDFs open with an empty user password.
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.document()?
            .extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(doc, page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.image_from_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    fn extract_pages_text(&self) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// Extract a PDF's text page by page.
///
/// Pages with embedded text use it. Pages without any are rendered and
/// OCR'd, primary engine first and secondary after; without a renderer, or
/// when rendering fails or reads blank, the page's embedded raster images
/// are OCR'd instead. When lopdf cannot decode text on any page,
/// `pdf-extract` is tried on the same pages before giving up on embedded
/// text.
pub fn extract_text(
    data: &[u8],
    ocr: &OcrEngines,
    renderer: Option<&dyn PageRenderer>,
    config: &PdfConfig,
) -> std::result::Result<String, ExtractionError> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;

    let mut page_count = extractor.page_count();
    if config.max_pages > 0 && page_count as usize > config.max_pages {
        warn!(
            "PDF has {} pages, processing the first {}",
            page_count, config.max_pages
        );
        page_count = config.max_pages as u32;
    }

    let mut texts: Vec<Option<String>> = Vec::with_capacity(page_count as usize);
    let mut text_errors = 0;

    for page in 1..=page_count {
        match extractor.extract_page_text(page) {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Page {}: {} chars of embedded text", page, text.len());
                texts.push(Some(text));
            }
            Ok(_) => texts.push(None),
            Err(e) => {
                debug!("Page {}: embedded text unavailable: {}", page, e);
                text_errors += 1;
                texts.push(None);
            }
        }
    }

    if text_errors == page_count {
        match extractor.extract_pages_text() {
            Ok(pages) => {
                let text = first_pages(pages, page_count);
                if !text.trim().is_empty() {
                    debug!("Recovered {} chars with pdf-extract", text.len());
                    return Ok(text);
                }
            }
            Err(e) => debug!("pdf-extract failed: {}", e),
        }
    }

    let mut ocr_error: Option<OcrError> = None;

    if config.ocr_fallback {
        let missing: Vec<u32> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| text.is_none())
            .map(|(index, _)| index as u32 + 1)
            .collect();
        let bitmaps = render_missing(renderer, &extractor.raw_data, &missing);

        for (page, bitmap) in missing.into_iter().zip(bitmaps) {
            match ocr_page(&extractor, page, bitmap, ocr) {
                Ok(Some(text)) => texts[page as usize - 1] = Some(text),
                Ok(None) => warn!("Page {}: no text found by OCR", page),
                Err(e) => {
                    warn!("Page {}: OCR failed: {}", page, e);
                    ocr_error = Some(e);
                }
            }
        }
    }

    let pages: Vec<String> = texts.into_iter().flatten().collect();
    if pages.is_empty() {
        return Err(match ocr_error {
            Some(e) => ExtractionError::Ocr(e),
            None => ExtractionError::NoTextExtracted,
        });
    }

    Ok(pages.join("\n"))
}

/// The first `limit` pages, one per line.
fn first_pages(pages: Vec<String>, limit: u32) -> String {
    pages
        .into_iter()
        .take(limit as usize)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One bitmap slot per page in `pages`, empty where nothing was rendered.
fn render_missing(
    renderer: Option<&dyn PageRenderer>,
    data: &[u8],
    pages: &[u32],
) -> Vec<Option<DynamicImage>> {
    let none = || vec![None; pages.len()];
    let Some(renderer) = renderer else {
        return none();
    };
    if pages.is_empty() {
        return Vec::new();
    }

    match renderer.render_pages(data, pages) {
        Ok(bitmaps) if bitmaps.len() == pages.len() => {
            debug!("Rendered {} pages with {}", pages.len(), renderer.name());
            bitmaps.into_iter().map(Some).collect()
        }
        Ok(bitmaps) => {
            warn!(
                "{} rendered {} of {} pages, using embedded images",
                renderer.name(),
                bitmaps.len(),
                pages.len()
            );
            none()
        }
        Err(e) => {
            warn!("{} could not render pages, using embedded images: {}", renderer.name(), e);
            none()
        }
    }
}

fn ocr_page(
    extractor: &PdfExtractor,
    page: u32,
    bitmap: Option<DynamicImage>,
    ocr: &OcrEngines,
) -> std::result::Result<Option<String>, OcrError> {
    if let Some(bitmap) = bitmap {
        let text = ocr.recognize(&bitmap)?;
        let text = text.trim();
        if !text.is_empty() {
            return Ok(Some(text.to_string()));
        }
        debug!("Page {}: rendered page read blank, trying embedded images", page);
    }

    let images = match extractor.extract_images(page) {
        Ok(images) => images,
        Err(e) => {
            warn!("Page {}: could not read images: {}", page, e);
            return Ok(None);
        }
    };

    let mut parts = Vec::new();
    for image in &images {
        let text = ocr.recognize(image)?;
        let text = text.trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    Ok((!parts.is_empty()).then(|| parts.join("\n")))
}
