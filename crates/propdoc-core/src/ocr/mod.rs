//! OCR engines.
//!
//! Engines are expensive to load, so the pipeline shares one process-wide
//! [`OcrEngines`] pair (see [`shared`]) that is created on first use and then
//! only read. Each loaded model runs on its own worker thread.

mod pure_engine;
mod worker;

pub use pure_engine::{DETECTION_MODEL, DICTIONARY, PureOcrEngine, RECOGNITION_MODEL};

use std::sync::{Arc, OnceLock};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Something that turns a bitmap into text.
pub trait OcrBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Recognize all text in the image, lines joined with `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Primary OCR engine plus an optional secondary used when the primary fails
/// or reads nothing.
pub struct OcrEngines {
    primary: Option<Box<dyn OcrBackend>>,
    secondary: Option<Box<dyn OcrBackend>>,
}

impl OcrEngines {
    pub fn new(primary: Box<dyn OcrBackend>, secondary: Option<Box<dyn OcrBackend>>) -> Self {
        Self {
            primary: Some(primary),
            secondary,
        }
    }

    /// No engines at all; every recognition fails with [`OcrError::Unavailable`].
    pub fn none() -> Self {
        Self {
            primary: None,
            secondary: None,
        }
    }

    /// Load engines from the configured model directories.
    ///
    /// A missing primary is tolerated so text-only documents still work;
    /// recognition then reports the load failure.
    pub fn load(config: &OcrConfig) -> Self {
        let primary = match PureOcrEngine::from_dir(&config.model_dir, config) {
            Ok(engine) => Some(Box::new(engine) as Box<dyn OcrBackend>),
            Err(e) => {
                warn!("Primary OCR engine unavailable: {}", e);
                None
            }
        };

        let secondary = config.fallback_model_dir.as_ref().and_then(|dir| {
            match PureOcrEngine::from_dir(dir, config) {
                Ok(engine) => Some(Box::new(engine) as Box<dyn OcrBackend>),
                Err(e) => {
                    warn!("Secondary OCR engine unavailable: {}", e);
                    None
                }
            }
        });

        info!(
            "OCR engines ready: primary={}, secondary={}",
            primary.is_some(),
            secondary.is_some()
        );

        Self { primary, secondary }
    }

    pub fn has_engine(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    /// Recognize text with the primary engine, falling back to the secondary.
    ///
    /// Returns an empty string when an engine ran but found nothing, and an
    /// error only when no engine could run at all.
    pub fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut last_error = None;
        let mut ran = false;

        for engine in self.primary.iter().chain(self.secondary.iter()) {
            match engine.recognize(image) {
                Ok(text) if !text.trim().is_empty() => return Ok(text),
                Ok(_) => {
                    debug!("OCR engine {} found no text", engine.name());
                    ran = true;
                }
                Err(e) => {
                    warn!("OCR engine {} failed: {}", engine.name(), e);
                    last_error = Some(e);
                }
            }
        }

        if ran {
            Ok(String::new())
        } else {
            Err(last_error.unwrap_or(OcrError::Unavailable))
        }
    }
}

static SHARED: OnceLock<Arc<OcrEngines>> = OnceLock::new();

/// Process-wide engines, loaded from `config` on first call.
///
/// Later calls return the same engines regardless of `config`.
pub fn shared(config: &OcrConfig) -> Arc<OcrEngines> {
    SHARED
        .get_or_init(|| Arc::new(OcrEngines::load(config)))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(&'static str, Result<&'static str, ()>);

    impl OcrBackend for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            self.1
                .map(str::to_string)
                .map_err(|_| OcrError::Recognition(format!("{} broke", self.0)))
        }
    }

    fn blank() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[test]
    fn test_primary_wins() {
        let engines = OcrEngines::new(
            Box::new(Fixed("primary", Ok("Rent: $900"))),
            Some(Box::new(Fixed("secondary", Ok("other")))),
        );
        assert_eq!(engines.recognize(&blank()).unwrap(), "Rent: $900");
    }

    #[test]
    fn test_secondary_on_failure_or_empty() {
        let failing = OcrEngines::new(
            Box::new(Fixed("primary", Err(()))),
            Some(Box::new(Fixed("secondary", Ok("from secondary")))),
        );
        assert_eq!(failing.recognize(&blank()).unwrap(), "from secondary");

        let empty = OcrEngines::new(
            Box::new(Fixed("primary", Ok("  "))),
            Some(Box::new(Fixed("secondary", Ok("from secondary")))),
        );
        assert_eq!(empty.recognize(&blank()).unwrap(), "from secondary");
    }

    #[test]
    fn test_nothing_read() {
        let engines = OcrEngines::new(Box::new(Fixed("primary", Ok(""))), None);
        assert_eq!(engines.recognize(&blank()).unwrap(), "");

        let broken = OcrEngines::new(Box::new(Fixed("primary", Err(()))), None);
        assert!(matches!(broken.recognize(&blank()), Err(OcrError::Recognition(_))));

        assert!(matches!(OcrEngines::none().recognize(&blank()), Err(OcrError::Unavailable)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shared_from_blocking_tasks() {
        let config = OcrConfig {
            model_dir: std::path::PathBuf::from("/nonexistent/propdoc-models"),
            ..OcrConfig::default()
        };

        let first = {
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                let engines = shared(&config);
                let _ = engines.recognize(&blank());
                engines
            })
        };
        let second = tokio::task::spawn_blocking(move || shared(&config));

        let (first, second) = (first.await.unwrap(), second.await.unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
