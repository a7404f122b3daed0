use tracing::info;

use super::{IngestRequest, Ingestor, StageTimer};
use crate::error::{PersistenceError, ResolutionError, Result, Stage, StageExt};
use crate::mapping::map_contract;
use crate::models::entities::IngestedRecord;
use crate::models::{DocumentKind, FieldMap};
use crate::resolve::{resolve_vendor, verify_property};
use crate::store::{self, DocumentLinks};

impl Ingestor {
    pub(super) async fn ingest_contract(
        &self,
        fields: &FieldMap,
        request: &IngestRequest,
        timer: &mut StageTimer,
    ) -> Result<IngestedRecord> {
        let owner_id = request.owner_id;
        let property_id = request
            .property_id
            .ok_or(ResolutionError::PropertyIdRequired(DocumentKind::Contract))
            .at(Stage::ResolveProperty)?;

        let record = map_contract(fields).at(Stage::MapFields)?;
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

        let contract = store::insert_contract(
            &mut tx,
            owner_id,
            property.id,
            vendor.as_ref().map(|v| v.id),
            &record,
        )
        .await
        .at(Stage::CreatePrimaryRecord)?;
        info!("Created contract {} ({})", contract.id, contract.contract_type);
        timer.lap(Stage::CreatePrimaryRecord);

        let links = DocumentLinks {
            property_id: Some(property.id),
            contract_id: Some(contract.id),
            ..DocumentLinks::default()
        };
        store::insert_document(
            &mut tx,
            owner_id,
            DocumentKind::Contract,
            record.description.as_deref(),
            &links,
        )
        .await
        .at(Stage::CreateDocumentRecord)?;
        timer.lap(Stage::CreateDocumentRecord);

        tx.commit().await.at(Stage::Commit)?;
        timer.lap(Stage::Commit);

        let mut conn = self.pool.acquire().await.at(Stage::ReloadWithRelations)?;
        let view = store::load_contract(&mut conn, contract.id)
            .await
            .and_then(|view| view.ok_or(PersistenceError::Missing("contract")))
            .at(Stage::ReloadWithRelations)?;
        timer.lap(Stage::ReloadWithRelations);

        Ok(IngestedRecord::Contract(view))
    }
}
