//! Per-type ingestion orchestrators.
//!
//! A run moves linearly through the [`Stage`]s and stops at the first
//! failure, tagged with the stage it happened in:
//!
//! ```text
//! ExtractText -> ExtractFields -> MapFields -> ResolveProperty
//!   -> ResolveSecondaryEntity -> CreatePrimaryRecord -> CreateDocumentRecord
//!   -> LinkRelationships -> Commit -> ReloadWithRelations -> Serialize
//! ```
//!
//! Everything up to `MapFields` happens before any write. All writes of a
//! run share one transaction, which rolls back when dropped uncommitted.

mod contract;
mod invoice;
mod lease;

use std::time::{Duration, Instant};

use sqlx::SqlitePool;
use tracing::{Instrument, debug, error, info, info_span};

use crate::error::{ExtractionError, IngestError, ResolutionError, Result, Stage, StageExt};
use crate::extract::TextExtractor;
use crate::mapping::normalize_keys;
use crate::models::entities::IngestedRecord;
use crate::models::{DocumentKind, FieldMap};
use crate::reasoning::{DocumentTag, StructuredExtractor};

/// Category of the expense synthesized for every invoice.
pub const INVOICE_EXPENSE_CATEGORY: &str = "Invoice Expense";

/// One uploaded document to ingest.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub document_type: DocumentKind,
    /// Required for invoices and contracts; optional for leases.
    pub property_id: Option<i64>,
    pub owner_id: i64,
}

/// Runs uploads through extraction, mapping and persistence.
#[derive(Clone)]
pub struct Ingestor {
    extractor: TextExtractor,
    client: StructuredExtractor,
    pool: SqlitePool,
}

impl Ingestor {
    pub fn new(extractor: TextExtractor, client: StructuredExtractor, pool: SqlitePool) -> Self {
        Self {
            extractor,
            client,
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ingest one document and return the committed record with its relations.
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestedRecord> {
        let span = info_span!(
            "ingest",
            document_type = %request.document_type,
            owner_id = request.owner_id,
            filename = %request.filename,
        );

        async move {
            let result = self.run(&request).await;
            match &result {
                Ok(_) => info!("Ingestion complete"),
                Err(e) => error!(stage = %e.stage, class = %e.class(), "Ingestion failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// [`ingest`](Self::ingest), then serialize the record as pretty JSON.
    pub async fn ingest_json(&self, request: IngestRequest) -> Result<String> {
        let record = self.ingest(request).await?;
        record.to_json_pretty().at(Stage::Serialize)
    }

    /// Determine whether a document is a lease, invoice or contract.
    pub async fn classify(&self, bytes: Vec<u8>, filename: &str) -> Result<Option<DocumentKind>> {
        let text = self.extract_text(bytes, filename).await?;
        self.client
            .determine_document_type(&text)
            .await
            .at(Stage::ExtractFields)
    }

    /// Plain text of a document, extracted on a blocking thread.
    pub async fn extract_text(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        let extractor = self.extractor.clone();
        let name = filename.to_string();

        tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &name))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))
            .and_then(|result| result)
            .at(Stage::ExtractText)
    }

    async fn run(&self, request: &IngestRequest) -> Result<IngestedRecord> {
        let kind = request.document_type;
        if kind != DocumentKind::Lease && request.property_id.is_none() {
            return Err(IngestError::new(
                Stage::ResolveProperty,
                ResolutionError::PropertyIdRequired(kind),
            ));
        }

        let mut timer = StageTimer::start();

        let text = self
            .extract_text(request.bytes.clone(), &request.filename)
            .await?;
        timer.lap(Stage::ExtractText);

        let fields = self
            .client
            .extract_information(&text, &DocumentTag::from(kind))
            .await
            .at(Stage::ExtractFields)?;
        let fields: FieldMap = normalize_keys(&fields);
        debug!("Extracted {} fields", fields.len());
        timer.lap(Stage::ExtractFields);

        let record = match kind {
            DocumentKind::Lease => self.ingest_lease(&fields, request, &mut timer).await?,
            DocumentKind::Invoice => self.ingest_invoice(&fields, request, &mut timer).await?,
            DocumentKind::Contract => self.ingest_contract(&fields, request, &mut timer).await?,
        };

        timer.finish();
        Ok(record)
    }
}

/// Wall-clock time of each completed stage, logged when the run ends.
pub(crate) struct StageTimer {
    started: Instant,
    last: Instant,
    laps: Vec<(Stage, Duration)>,
}

impl StageTimer {
    fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
            laps: Vec::new(),
        }
    }

    pub(crate) fn lap(&mut self, stage: Stage) {
        let now = Instant::now();
        self.laps.push((stage, now - self.last));
        self.last = now;
    }

    fn finish(&self) {
        let laps: Vec<String> = self
            .laps
            .iter()
            .map(|(stage, elapsed)| format!("{stage}={}ms", elapsed.as_millis()))
            .collect();
        info!(
            "Stage timings: {} (total {}ms)",
            laps.join(" "),
            self.started.elapsed().as_millis()
        );
    }
}
