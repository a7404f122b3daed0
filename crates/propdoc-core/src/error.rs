//! Error types for the propdoc-core library.

use std::fmt;

use thiserror::Error;

use crate::models::DocumentKind;

/// Errors raised while turning an upload into plain text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The file extension does not map to any extraction strategy.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Every strategy ran but nothing readable came out.
    #[error("no text could be extracted from the document")]
    NoTextExtracted,

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The container or markup of a document could not be read.
    #[error("failed to decode document: {0}")]
    Decode(String),

    /// Extraction task was cancelled or panicked.
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// A page could not be rasterized.
    #[error("failed to render page: {0}")]
    Render(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is configured.
    #[error("no OCR engine available")]
    Unavailable,
}

/// Errors from the external reasoning service.
#[derive(Error, Debug, Clone)]
pub enum ReasoningError {
    /// Network or transport error.
    #[error("communication error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// The service answered but the envelope carried no usable reply.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials are missing from the environment.
    #[error("API key not set in ${0}")]
    MissingApiKey(String),
}

impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        ReasoningError::Transport(err.to_string())
    }
}

/// Errors raised while mapping a field map onto a canonical record.
#[derive(Error, Debug)]
pub enum MappingError {
    /// The reasoning reply produced no fields at all.
    #[error("no fields were extracted from the document")]
    NothingExtracted,

    /// A field required for persistence is absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A group had the wrong shape (e.g. a string where an object was expected).
    #[error("malformed field {field}: {reason}")]
    Shape { field: String, reason: String },
}

/// Errors raised while resolving referenced entities.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The referenced record belongs to another owner.
    #[error("{entity} {id} does not belong to owner {owner_id}")]
    PermissionDenied {
        entity: &'static str,
        id: i64,
        owner_id: i64,
    },

    /// No property identity was given and none could be derived.
    #[error("property address is required when no property_id is provided")]
    PropertyRequired,

    /// The document type can only be filed against an existing property.
    #[error("property_id is required for {0} documents")]
    PropertyIdRequired(DocumentKind),

    /// Database error during lookup.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<sqlx::Error> for ResolutionError {
    fn from(err: sqlx::Error) -> Self {
        ResolutionError::Persistence(err.into())
    }
}

/// Errors from the persistence layer.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// An integrity constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Any other database error.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("failed to encode column {column}: {reason}")]
    Encode { column: &'static str, reason: String },

    /// A row expected after a write is missing.
    #[error("{0} vanished after write")]
    Missing(&'static str),
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if is_integrity(db.kind()) => {
                PersistenceError::Constraint(db.message().to_string())
            }
            _ => PersistenceError::Database(err),
        }
    }
}

fn is_integrity(kind: sqlx::error::ErrorKind) -> bool {
    matches!(
        kind,
        sqlx::error::ErrorKind::UniqueViolation
            | sqlx::error::ErrorKind::ForeignKeyViolation
            | sqlx::error::ErrorKind::NotNullViolation
            | sqlx::error::ErrorKind::CheckViolation
    )
}

/// Pipeline stage at which an ingestion run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractText,
    ExtractFields,
    MapFields,
    ResolveProperty,
    ResolveSecondaryEntity,
    CreatePrimaryRecord,
    CreateDocumentRecord,
    LinkRelationships,
    Commit,
    ReloadWithRelations,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ExtractText => "extract_text",
            Stage::ExtractFields => "extract_fields",
            Stage::MapFields => "map_fields",
            Stage::ResolveProperty => "resolve_property",
            Stage::ResolveSecondaryEntity => "resolve_secondary_entity",
            Stage::CreatePrimaryRecord => "create_primary_record",
            Stage::CreateDocumentRecord => "create_document_record",
            Stage::LinkRelationships => "link_relationships",
            Stage::Commit => "commit",
            Stage::ReloadWithRelations => "reload_with_relations",
            Stage::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a failed ingestion run.
#[derive(Error, Debug)]
pub enum Failure {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Reasoning(#[from] ReasoningError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Failure {
    fn from(err: sqlx::Error) -> Self {
        Failure::Persistence(err.into())
    }
}

/// User-visible class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Unreadable,
    NotUnderstood,
    NotSaved,
    NotFound,
    PermissionDenied,
}

impl FailureClass {
    /// Message shown to the person who uploaded the document.
    pub fn message(&self) -> &'static str {
        match self {
            FailureClass::Unreadable => "could not read document",
            FailureClass::NotUnderstood => "could not understand document",
            FailureClass::NotSaved => "document understood but could not be saved",
            FailureClass::NotFound => "not found",
            FailureClass::PermissionDenied => "permission denied",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A failed ingestion run: the stage it stopped at and why.
#[derive(Error, Debug)]
#[error("{stage}: {failure}")]
pub struct IngestError {
    pub stage: Stage,
    #[source]
    pub failure: Failure,
}

impl IngestError {
    pub fn new(stage: Stage, failure: impl Into<Failure>) -> Self {
        Self {
            stage,
            failure: failure.into(),
        }
    }

    pub fn class(&self) -> FailureClass {
        match &self.failure {
            Failure::Extraction(_) => FailureClass::Unreadable,
            Failure::Reasoning(_) | Failure::Mapping(_) => FailureClass::NotUnderstood,
            Failure::Resolution(ResolutionError::NotFound { .. })
            | Failure::Resolution(ResolutionError::PropertyIdRequired(_)) => FailureClass::NotFound,
            Failure::Resolution(ResolutionError::PermissionDenied { .. }) => {
                FailureClass::PermissionDenied
            }
            Failure::Resolution(ResolutionError::PropertyRequired) => FailureClass::NotUnderstood,
            Failure::Resolution(ResolutionError::Persistence(_))
            | Failure::Persistence(_)
            | Failure::Serialize(_) => FailureClass::NotSaved,
        }
    }
}

/// Tag every error of a stage with that stage.
pub(crate) trait StageExt<T> {
    fn at(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<Failure>> StageExt<T> for std::result::Result<T, E> {
    fn at(self, stage: Stage) -> Result<T> {
        self.map_err(|e| IngestError::new(stage, e))
    }
}

/// Result type for ingestion runs.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        let err = IngestError::new(Stage::ExtractText, ExtractionError::NoTextExtracted);
        assert_eq!(err.class(), FailureClass::Unreadable);

        let err = IngestError::new(Stage::MapFields, MappingError::NothingExtracted);
        assert_eq!(err.class(), FailureClass::NotUnderstood);

        let err = IngestError::new(
            Stage::ResolveProperty,
            ResolutionError::PermissionDenied {
                entity: "property",
                id: 4,
                owner_id: 1,
            },
        );
        assert_eq!(err.class(), FailureClass::PermissionDenied);

        let err = IngestError::new(Stage::Commit, PersistenceError::Constraint("x".into()));
        assert_eq!(err.class().message(), "document understood but could not be saved");
    }

    #[test]
    fn test_stage_in_message() {
        let err = IngestError::new(Stage::ExtractFields, ReasoningError::Transport("reset".into()));
        assert_eq!(err.to_string(), "extract_fields: communication error: reset");
    }
}
