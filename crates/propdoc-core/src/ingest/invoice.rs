use chrono::Utc;
use tracing::info;

use super::{INVOICE_EXPENSE_CATEGORY, IngestRequest, Ingestor, StageTimer};
use crate::error::{PersistenceError, ResolutionError, Result, Stage, StageExt};
use crate::mapping::map_invoice;
use crate::models::entities::IngestedRecord;
use crate::models::{DocumentKind, FieldMap};
use crate::resolve::{resolve_vendor, verify_property};
use crate::store::{self, DocumentLinks};

impl Ingestor {
    /// Invoice: vendor found or created, the invoice with its line items,
    /// its document, and a mirroring expense.
    pub(super) async fn ingest_invoice(
        &self,
        fields: &FieldMap,
        request: &IngestRequest,
        timer: &mut StageTimer,
    ) -> Result<IngestedRecord> {
        let owner_id = request.owner_id;
        let property_id = request
            .property_id
            .ok_or(ResolutionError::PropertyIdRequired(DocumentKind::Invoice))
            .at(Stage::ResolveProperty)?;

        let record = map_invoice(fields).at(Stage::MapFields)?;
        timer.lap(Stage::MapFields);

        let mut tx = self.pool.begin().await.at(Stage::ResolveProperty)?;
        let property = verify_property(&mut tx, property_id, owner_id)
            .await
            .at(Stage::ResolveProperty)?;
        timer.lap(Stage::ResolveProperty);

        let vendor = match &record.vendor {
            Some(described) => Some(
                resolve_vendor(&mut tx, owner_id, described)
                    .await
                    .at(Stage::ResolveSecondaryEntity)?,
            ),
            None => None,
        };
        timer.lap(Stage::ResolveSecondaryEntity);

        let invoice = store::insert_invoice(
            &mut tx,
            owner_id,
            property.id,
            vendor.as_ref().map(|v| v.id),
            &record,
        )
        .await
        .at(Stage::CreatePrimaryRecord)?;
        store::insert_invoice_items(&mut tx, invoice.id, &record.line_items)
            .await
            .at(Stage::CreatePrimaryRecord)?;
        info!(
            "Created invoice {} with {} line items",
            invoice.id,
            record.line_items.len()
        );
        timer.lap(Stage::CreatePrimaryRecord);

        let links = DocumentLinks {
            property_id: Some(property.id),
            invoice_id: Some(invoice.id),
            ..DocumentLinks::default()
        };
        store::insert_document(
            &mut tx,
            owner_id,
            DocumentKind::Invoice,
            record.description.as_deref(),
            &links,
        )
        .await
        .at(Stage::CreateDocumentRecord)?;
        timer.lap(Stage::CreateDocumentRecord);

        let transaction_date = invoice
            .invoice_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let expense = store::insert_invoice_expense(
            &mut tx,
            &invoice,
            INVOICE_EXPENSE_CATEGORY,
            transaction_date,
        )
        .await
        .at(Stage::LinkRelationships)?;
        info!("Created expense {} for invoice {}", expense.id, invoice.id);
        timer.lap(Stage::LinkRelationships);

        tx.commit().await.at(Stage::Commit)?;
        timer.lap(Stage::Commit);

        let mut conn = self.pool.acquire().await.at(Stage::ReloadWithRelations)?;
        let view = store::load_invoice(&mut conn, invoice.id)
            .await
            .and_then(|view| view.ok_or(PersistenceError::Missing("invoice")))
            .at(Stage::ReloadWithRelations)?;
        timer.lap(Stage::ReloadWithRelations);

        Ok(IngestedRecord::Invoice(view))
    }
}
