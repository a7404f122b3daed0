//! Owner-scoped inserts. Each returns the stored row.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::SqliteConnection;
use sqlx::types::Json;
use tracing::debug;

use super::{address_key, tenant_key};
use crate::error::PersistenceError;
use crate::models::DocumentKind;
use crate::models::entities::{
    Contract, Document, Expense, Invoice, InvoiceItem, Lease, Property, Tenant, Vendor,
};
use crate::models::records::{
    ContractRecord, InvoiceRecord, LeaseRecord, LineItemRecord, PropertyRecord, TenantRecord,
    VendorRecord,
};

pub async fn insert_property(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &PropertyRecord,
) -> Result<Property, PersistenceError> {
    let property: Property = sqlx::query_as(
        r#"
        INSERT INTO properties (owner_id, address, address_key, num_bedrooms, num_bathrooms, num_floors, is_commercial, property_type)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(record.address.trim())
    .bind(address_key(&record.address))
    .bind(record.num_bedrooms)
    .bind(record.num_bathrooms)
    .bind(record.num_floors)
    .bind(record.is_commercial)
    .bind(&record.property_type)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted property {}", property.id);
    Ok(property)
}

pub async fn insert_vendor(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &VendorRecord,
) -> Result<Vendor, PersistenceError> {
    let vendor: Vendor = sqlx::query_as(
        r#"
        INSERT INTO vendors (owner_id, name, contact_person, phone_number, email, address)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(&record.name)
    .bind(&record.contact_person)
    .bind(&record.phone_number)
    .bind(&record.email)
    .bind(&record.address)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted vendor {}", vendor.id);
    Ok(vendor)
}

pub async fn insert_tenant(
    conn: &mut SqliteConnection,
    owner_id: i64,
    record: &TenantRecord,
) -> Result<Tenant, PersistenceError> {
    let tenant: Tenant = sqlx::query_as(
        r#"
        INSERT INTO tenants (owner_id, first_name, last_name, email, phone_number, date_of_birth, landlord, address, status, match_key)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.email)
    .bind(&record.phone_number)
    .bind(record.date_of_birth)
    .bind(&record.landlord)
    .bind(&record.address)
    .bind(&record.status)
    .bind(tenant_key(
        &record.first_name,
        &record.last_name,
        record.landlord.as_deref(),
    ))
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted tenant {}", tenant.id);
    Ok(tenant)
}

/// Point a tenant at its lease and the leased property.
pub async fn link_tenant(
    conn: &mut SqliteConnection,
    tenant_id: i64,
    lease_id: i64,
    property_id: i64,
) -> Result<(), PersistenceError> {
    let result = sqlx::query("UPDATE tenants SET lease_id = ?, property_id = ? WHERE id = ?")
        .bind(lease_id)
        .bind(property_id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(PersistenceError::Missing("tenant"));
    }
    Ok(())
}

pub async fn insert_lease(
    conn: &mut SqliteConnection,
    owner_id: i64,
    property_id: i64,
    record: &LeaseRecord,
) -> Result<Lease, PersistenceError> {
    let tenant_info = serde_json::to_value(&record.tenant).map_err(|e| PersistenceError::Encode {
        column: "tenant_info",
        reason: e.to_string(),
    })?;

    let lease: Lease = sqlx::query_as(
        r#"
        INSERT INTO leases (owner_id, property_id, lease_type, description, rent_amount_total, rent_amount_monthly,
                            security_deposit_amount, security_deposit_held_by, start_date, end_date,
                            payment_frequency, tenant_info, special_lease_terms, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(property_id)
    .bind(&record.lease_type)
    .bind(&record.description)
    .bind(record.rent_amount_total)
    .bind(record.rent_amount_monthly)
    .bind(&record.security_deposit_amount)
    .bind(&record.security_deposit_held_by)
    .bind(record.start_date)
    .bind(record.end_date)
    .bind(&record.payment_frequency)
    .bind(Json(tenant_info))
    .bind(Json(&record.special_lease_terms))
    .bind(record.is_active)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted lease {}", lease.id);
    Ok(lease)
}

pub async fn insert_invoice(
    conn: &mut SqliteConnection,
    owner_id: i64,
    property_id: i64,
    vendor_id: Option<i64>,
    record: &InvoiceRecord,
) -> Result<Invoice, PersistenceError> {
    let invoice: Invoice = sqlx::query_as(
        r#"
        INSERT INTO invoices (owner_id, property_id, vendor_id, invoice_number, amount, paid_amount,
                              remaining_balance, invoice_date, due_date, status, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(property_id)
    .bind(vendor_id)
    .bind(&record.invoice_number)
    .bind(record.amount)
    .bind(record.paid_amount)
    .bind(record.remaining_balance)
    .bind(record.invoice_date)
    .bind(record.due_date)
    .bind(&record.status)
    .bind(&record.description)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted invoice {}", invoice.id);
    Ok(invoice)
}

pub async fn insert_invoice_items(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    items: &[LineItemRecord],
) -> Result<Vec<InvoiceItem>, PersistenceError> {
    let mut stored = Vec::with_capacity(items.len());

    for item in items {
        let row: InvoiceItem = sqlx::query_as(
            r#"
            INSERT INTO invoice_items (invoice_id, description, quantity, unit_price, total_price)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .fetch_one(&mut *conn)
        .await?;
        stored.push(row);
    }

    debug!("Inserted {} line items for invoice {}", stored.len(), invoice_id);
    Ok(stored)
}

/// Expense mirroring an invoice's amount, date and description.
pub async fn insert_invoice_expense(
    conn: &mut SqliteConnection,
    invoice: &Invoice,
    category: &str,
    transaction_date: NaiveDate,
) -> Result<Expense, PersistenceError> {
    let expense: Expense = sqlx::query_as(
        r#"
        INSERT INTO expenses (owner_id, property_id, vendor_id, invoice_id, category, amount, transaction_date, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(invoice.owner_id)
    .bind(invoice.property_id)
    .bind(invoice.vendor_id)
    .bind(invoice.id)
    .bind(category)
    .bind(invoice.amount)
    .bind(transaction_date)
    .bind(&invoice.description)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted expense {} for invoice {}", expense.id, invoice.id);
    Ok(expense)
}

pub async fn insert_contract(
    conn: &mut SqliteConnection,
    owner_id: i64,
    property_id: i64,
    vendor_id: Option<i64>,
    record: &ContractRecord,
) -> Result<Contract, PersistenceError> {
    let contract: Contract = sqlx::query_as(
        r#"
        INSERT INTO contracts (owner_id, property_id, vendor_id, contract_type, description, start_date,
                               end_date, terms, parties_involved, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(property_id)
    .bind(vendor_id)
    .bind(&record.contract_type)
    .bind(&record.description)
    .bind(record.start_date)
    .bind(record.end_date)
    .bind(Json(&record.terms))
    .bind(Json(Value::Array(record.parties_involved.clone())))
    .bind(record.is_active)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted contract {}", contract.id);
    Ok(contract)
}

/// References of a new document record.
#[derive(Debug, Clone, Default)]
pub struct DocumentLinks {
    pub property_id: Option<i64>,
    pub lease_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub contract_id: Option<i64>,
}

pub async fn insert_document(
    conn: &mut SqliteConnection,
    owner_id: i64,
    kind: DocumentKind,
    description: Option<&str>,
    links: &DocumentLinks,
) -> Result<Document, PersistenceError> {
    let document: Document = sqlx::query_as(
        r#"
        INSERT INTO documents (owner_id, property_id, lease_id, tenant_id, invoice_id, contract_id,
                               document_type, description, upload_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(owner_id)
    .bind(links.property_id)
    .bind(links.lease_id)
    .bind(links.tenant_id)
    .bind(links.invoice_id)
    .bind(links.contract_id)
    .bind(kind.label())
    .bind(description)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted {} document {}", kind, document.id);
    Ok(document)
}
