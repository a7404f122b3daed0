//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::OcrBackend;
use super::worker::{LocalEngine, OcrWorker};

/// Detection model file name inside a model directory.
pub const DETECTION_MODEL: &str = "det.onnx";
/// Recognition model file name inside a model directory.
pub const RECOGNITION_MODEL: &str = "latin_rec.onnx";
/// Character dictionary file name inside a model directory.
pub const DICTIONARY: &str = "latin_dict.txt";

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// The loaded session lives on its own [`OcrWorker`] thread; this handle can
/// be shared across pipeline runs and recognizes one image at a time.
pub struct PureOcrEngine {
    worker: OcrWorker,
    name: String,
    max_image_size: u32,
}

/// The session itself, owned by the worker thread.
struct Session {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

/// A recognized line with its top-left corner, used for ordering.
struct Line {
    x: f64,
    y: f64,
    text: String,
}

impl PureOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join(DETECTION_MODEL);
        let rec_path = model_dir.join(RECOGNITION_MODEL);
        let dict_path = model_dir.join(DICTIONARY);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("{} not found", path.display())));
            }
        }

        let keep_unk = config.keep_unk;
        let name = model_dir.display().to_string();
        let worker = OcrWorker::spawn(&name, move || {
            let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
                .det_model_path(&det_path)
                .rec_model_path(&rec_path)
                .dictionary_path(&dict_path)
                .build()
                .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;
            Ok(Session { engine, keep_unk })
        })?;

        info!("Loaded pure-onnx-ocr engine from {}", name);

        Ok(Self {
            worker,
            name,
            max_image_size: config.max_image_size,
        })
    }

    fn prepare<'a>(&self, image: &'a DynamicImage) -> std::borrow::Cow<'a, DynamicImage> {
        let (width, height) = image.dimensions();
        if self.max_image_size > 0 && width.max(height) > self.max_image_size {
            debug!(
                "Downscaling {}x{} image to fit {}px",
                width, height, self.max_image_size
            );
            std::borrow::Cow::Owned(image.resize(
                self.max_image_size,
                self.max_image_size,
                image::imageops::FilterType::Triangle,
            ))
        } else {
            std::borrow::Cow::Borrowed(image)
        }
    }
}

impl OcrBackend for PureOcrEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let image = self.prepare(image).into_owned();
        let text = self.worker.recognize(image)?;

        info!(
            "OCR complete: {} lines in {}ms",
            text.lines().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

impl LocalEngine for Session {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError> {
        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let mut lines: Vec<Line> = results
            .iter()
            .map(|r| {
                let (x, y) = r
                    .bounding_box
                    .exterior()
                    .coords()
                    .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)));
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Line { x, y, text }
            })
            .collect();

        // Reading order: 20px rows, then left to right.
        lines.sort_by(|a, b| {
            let row_a = (a.y / 20.0) as i64;
            let row_b = (b.y / 20.0) as i64;
            row_a
                .cmp(&row_b)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        Ok(lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
