//! Lookups and relation-populated reloads.

use sqlx::SqliteConnection;

use super::{address_key, tenant_key};
use crate::error::PersistenceError;
use crate::models::entities::{
    Contract, ContractView, Document, Expense, Invoice, InvoiceItem, InvoiceView, Lease,
    LeaseView, Property, Tenant, Vendor,
};

pub async fn get_property(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Property>, PersistenceError> {
    Ok(sqlx::query_as("SELECT * FROM properties WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn get_vendor(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Vendor>, PersistenceError> {
    Ok(sqlx::query_as("SELECT * FROM vendors WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Property of `owner_id` at `address`, compared by [`address_key`].
pub async fn find_property_by_address(
    conn: &mut SqliteConnection,
    owner_id: i64,
    address: &str,
) -> Result<Option<Property>, PersistenceError> {
    Ok(sqlx::query_as(
        "SELECT * FROM properties WHERE owner_id = ? AND address_key = ? ORDER BY id LIMIT 1",
    )
    .bind(owner_id)
    .bind(address_key(address))
    .fetch_optional(&mut *conn)
    .await?)
}

/// Vendor of `owner_id` with exactly this name.
pub async fn find_vendor_by_name(
    conn: &mut SqliteConnection,
    owner_id: i64,
    name: &str,
) -> Result<Option<Vendor>, PersistenceError> {
    Ok(
        sqlx::query_as("SELECT * FROM vendors WHERE owner_id = ? AND name = ? ORDER BY id LIMIT 1")
            .bind(owner_id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

/// Tenant of `owner_id` whose names and landlord match ignoring case and spaces.
///
/// Compared by [`tenant_key`].
pub async fn find_tenant(
    conn: &mut SqliteConnection,
    owner_id: i64,
    first_name: &str,
    last_name: &str,
    landlord: Option<&str>,
) -> Result<Option<Tenant>, PersistenceError> {
    Ok(sqlx::query_as(
        "SELECT * FROM tenants WHERE owner_id = ? AND match_key = ? ORDER BY id LIMIT 1",
    )
    .bind(owner_id)
    .bind(tenant_key(first_name, last_name, landlord))
    .fetch_optional(&mut *conn)
    .await?)
}

async fn document_where(
    conn: &mut SqliteConnection,
    column: &str,
    id: i64,
) -> Result<Option<Document>, PersistenceError> {
    let sql = format!("SELECT * FROM documents WHERE {column} = ? ORDER BY id LIMIT 1");
    Ok(sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn optional_vendor(
    conn: &mut SqliteConnection,
    vendor_id: Option<i64>,
) -> Result<Option<Vendor>, PersistenceError> {
    match vendor_id {
        Some(id) => get_vendor(conn, id).await,
        None => Ok(None),
    }
}

/// A lease with its property, tenants and document.
pub async fn load_lease(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<LeaseView>, PersistenceError> {
    let Some(lease): Option<Lease> = sqlx::query_as("SELECT * FROM leases WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let property = get_property(conn, lease.property_id)
        .await?
        .ok_or(PersistenceError::Missing("lease property"))?;

    let tenants: Vec<Tenant> = sqlx::query_as("SELECT * FROM tenants WHERE lease_id = ? ORDER BY id")
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    let document = document_where(conn, "lease_id", id).await?;

    Ok(Some(LeaseView {
        lease,
        property,
        tenants,
        document,
    }))
}

/// An invoice with its line items, vendor, expense and document.
pub async fn load_invoice(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<InvoiceView>, PersistenceError> {
    let Some(invoice): Option<Invoice> = sqlx::query_as("SELECT * FROM invoices WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let line_items: Vec<InvoiceItem> =
        sqlx::query_as("SELECT * FROM invoice_items WHERE invoice_id = ? ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    let vendor = optional_vendor(conn, invoice.vendor_id).await?;

    let expense: Option<Expense> = sqlx::query_as("SELECT * FROM expenses WHERE invoice_id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let document = document_where(conn, "invoice_id", id).await?;

    Ok(Some(InvoiceView {
        invoice,
        line_items,
        vendor,
        expense,
        document,
    }))
}

/// A contract with its property, vendor and document.
pub async fn load_contract(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ContractView>, PersistenceError> {
    let Some(contract): Option<Contract> = sqlx::query_as("SELECT * FROM contracts WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let property = get_property(conn, contract.property_id)
        .await?
        .ok_or(PersistenceError::Missing("contract property"))?;
    let vendor = optional_vendor(conn, contract.vendor_id).await?;
    let document = document_where(conn, "contract_id", id).await?;

    Ok(Some(ContractView {
        contract,
        property,
        vendor,
        document,
    }))
}

/// Number of rows in `table`.
pub async fn count_rows(conn: &mut SqliteConnection, table: &str) -> Result<i64, PersistenceError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&mut *conn).await?;
    Ok(count)
}
