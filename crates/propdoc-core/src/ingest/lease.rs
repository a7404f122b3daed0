use tracing::info;

use super::{IngestRequest, Ingestor, StageTimer};
use crate::error::{PersistenceError, ResolutionError, Result, Stage, StageExt};
use crate::mapping::map_lease;
use crate::models::entities::IngestedRecord;
use crate::models::{DocumentKind, FieldMap};
use crate::resolve::{resolve_property, resolve_tenant, verify_property};
use crate::store::{self, DocumentLinks};

impl Ingestor {
    /// Lease: property from the request or the document, tenant found or
    /// created, then the lease and its document, then tenant links.
    pub(super) async fn ingest_lease(
        &self,
        fields: &FieldMap,
        request: &IngestRequest,
        timer: &mut StageTimer,
    ) -> Result<IngestedRecord> {
        let owner_id = request.owner_id;
        let record = map_lease(fields, request.property_id.is_some()).at(Stage::MapFields)?;
        timer.lap(Stage::MapFields);

        let mut tx = self.pool.begin().await.at(Stage::ResolveProperty)?;

        let property = match request.property_id {
            Some(id) => verify_property(&mut tx, id, owner_id)
                .await
                .at(Stage::ResolveProperty)?,
            None => {
                let described = record
                    .property
                    .as_ref()
                    .ok_or(ResolutionError::PropertyRequired)
                    .at(Stage::ResolveProperty)?;
                resolve_property(&mut tx, owner_id, described)
                    .await
                    .at(Stage::ResolveProperty)?
            }
        };
        timer.lap(Stage::ResolveProperty);

        let tenant = resolve_tenant(&mut tx, owner_id, &record.tenant)
            .await
            .at(Stage::ResolveSecondaryEntity)?;
        timer.lap(Stage::ResolveSecondaryEntity);

        let lease = store::insert_lease(&mut tx, owner_id, property.id, &record)
            .await
            .at(Stage::CreatePrimaryRecord)?;
        info!("Created lease {} for property {}", lease.id, property.id);
        timer.lap(Stage::CreatePrimaryRecord);

        let links = DocumentLinks {
            property_id: Some(property.id),
            lease_id: Some(lease.id),
            tenant_id: Some(tenant.id),
            ..DocumentLinks::default()
        };
        store::insert_document(
            &mut tx,
            owner_id,
            DocumentKind::Lease,
            record.description.as_deref(),
            &links,
        )
        .await
        .at(Stage::CreateDocumentRecord)?;
        timer.lap(Stage::CreateDocumentRecord);

        store::link_tenant(&mut tx, tenant.id, lease.id, property.id)
            .await
            .at(Stage::LinkRelationships)?;
        timer.lap(Stage::LinkRelationships);

        tx.commit().await.at(Stage::Commit)?;
        timer.lap(Stage::Commit);

        let mut conn = self.pool.acquire().await.at(Stage::ReloadWithRelations)?;
        let view = store::load_lease(&mut conn, lease.id)
            .await
            .and_then(|view| view.ok_or(PersistenceError::Missing("lease")))
            .at(Stage::ReloadWithRelations)?;
        timer.lap(Stage::ReloadWithRelations);

        Ok(IngestedRecord::Lease(view))
    }
}
