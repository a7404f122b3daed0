//! Find-or-create resolution of referenced entities, scoped by owner.
//!
//! Every lookup is a read followed by a conditional write with no locking,
//! so two concurrent identical uploads by one owner can both miss and both
//! create.

use sqlx::SqliteConnection;
use tracing::info;

use crate::error::ResolutionError;
use crate::models::entities::{Property, Tenant, Vendor};
use crate::models::records::{PropertyRecord, TenantRecord, VendorRecord};
use crate::store;

/// Check that property `id` exists and belongs to `owner_id`.
pub async fn verify_property(
    conn: &mut SqliteConnection,
    id: i64,
    owner_id: i64,
) -> Result<Property, ResolutionError> {
    let property = store::get_property(conn, id)
        .await?
        .ok_or(ResolutionError::NotFound {
            entity: "property",
            id,
        })?;

    if property.owner_id != owner_id {
        return Err(ResolutionError::PermissionDenied {
            entity: "property",
            id,
            owner_id,
        });
    }

    Ok(property)
}

/// Property with the record's address, created when the owner has none.
pub async fn resolve_property(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &PropertyRecord,
) -> Result<Property, ResolutionError> {
    if !record.has_address() {
        return Err(ResolutionError::PropertyRequired);
    }

    if let Some(existing) = store::find_property_by_address(conn, owner_id, &record.address).await? {
        info!("Reusing property {} for {}", existing.id, existing.address);
        return Ok(existing);
    }

    let created = store::insert_property(conn, owner_id, record).await?;
    info!("Created property {} at {}", created.id, created.address);
    Ok(created)
}

pub async fn resolve_vendor(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &VendorRecord,
) -> Result<Vendor, ResolutionError> {
    if let Some(existing) = store::find_vendor_by_name(conn, owner_id, &record.name).await? {
        info!("Reusing vendor {} ({})", existing.id, existing.name);
        return Ok(existing);
    }

    let created = store::insert_vendor(conn, owner_id, record).await?;
    info!("Created vendor {} ({})", created.id, created.name);
    Ok(created)
}

pub async fn resolve_tenant(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &TenantRecord,
) -> Result<Tenant, ResolutionError> {
    let existing = store::find_tenant(
        conn,
        owner_id,
        &record.first_name,
        &record.last_name,
        record.landlord.as_deref(),
    )
    .await?;

    if let Some(existing) = existing {
        info!("Reusing tenant {}", existing.id);
        return Ok(existing);
    }

    let created = store::insert_tenant(conn, owner_id, record).await?;
    info!(
        "Created tenant {} ({} {})",
        created.id, created.first_name, created.last_name
    );
    Ok(created)
}
