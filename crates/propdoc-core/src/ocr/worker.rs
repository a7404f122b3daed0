//! A thread that owns one OCR engine.
//!
//! `pure-onnx-ocr` sessions keep per-session caches in `RefCell`s, so an
//! engine can neither move between threads nor be shared. The engine is
//! built on its worker thread and stays there; callers send images over a
//! channel and block on the reply.

use std::sync::mpsc::{self, Sender};
use std::thread;

use image::DynamicImage;
use tracing::debug;

use crate::error::OcrError;

/// An engine that lives on a single thread.
pub(crate) trait LocalEngine {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError>;
}

struct Job {
    image: DynamicImage,
    reply: Sender<Result<String, OcrError>>,
}

/// Handle to a worker thread. Cheap to share; jobs run one at a time.
pub(crate) struct OcrWorker {
    jobs: Sender<Job>,
}

impl OcrWorker {
    /// Start a worker named `name` and build its engine with `load` on that thread.
    ///
    /// Returns once the engine is loaded, or with the load error.
    pub(crate) fn spawn<E, F>(name: &str, load: F) -> Result<Self, OcrError>
    where
        E: LocalEngine,
        F: FnOnce() -> Result<E, OcrError> + Send + 'static,
    {
        let (jobs, inbox) = mpsc::channel::<Job>();
        let (ready, loaded) = mpsc::channel::<Result<(), OcrError>>();
        let thread_name = format!("ocr-{name}");

        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut engine = match load() {
                    Ok(engine) => {
                        let _ = ready.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready.send(Err(e));
                        return;
                    }
                };

                // Ends when every handle is dropped.
                for job in inbox {
                    let _ = job.reply.send(engine.recognize(&job.image));
                }
                debug!("{} stopped", thread_name);
            })
            .map_err(|e| OcrError::ModelLoad(format!("cannot start OCR thread: {e}")))?;

        loaded
            .recv()
            .map_err(|_| OcrError::ModelLoad("OCR thread exited while loading".to_string()))??;

        Ok(Self { jobs })
    }

    /// Run one image through the engine and wait for the text.
    pub(crate) fn recognize(&self, image: DynamicImage) -> Result<String, OcrError> {
        let (reply, answer) = mpsc::channel();
        self.jobs
            .send(Job { image, reply })
            .map_err(|_| OcrError::Recognition("OCR worker stopped".to_string()))?;

        answer
            .recv()
            .map_err(|_| OcrError::Recognition("OCR worker stopped".to_string()))?
    }
}
