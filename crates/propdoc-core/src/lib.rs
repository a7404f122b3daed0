//! Core library for property document ingestion.
//!
//! This crate provides:
//! - Text extraction from images, HEIC photos, PDFs (with OCR fallback) and DOCX
//! - Structured field extraction through an OpenAI-compatible reasoning service
//! - Field normalization and mapping onto typed lease, invoice and contract records
//! - Owner-scoped entity resolution and SQLite persistence
//! - Lease, invoice and contract orchestrators with stage-tagged failures

pub mod error;
pub mod extract;
pub mod ingest;
pub mod mapping;
pub mod models;
pub mod ocr;
pub mod reasoning;
pub mod resolve;
pub mod store;

pub use error::{FailureClass, IngestError, Result, Stage};
pub use extract::{Format, TextExtractor};
pub use ingest::{IngestRequest, Ingestor};
pub use models::config::PropdocConfig;
pub use models::entities::IngestedRecord;
pub use models::{DocumentKind, FieldMap};
pub use ocr::{OcrBackend, OcrEngines};
pub use reasoning::{MockReasoning, OpenAiService, ReasoningService, StructuredExtractor};
