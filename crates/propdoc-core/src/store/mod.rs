//! SQLite persistence.
//!
//! Writes and reads take a `&mut SqliteConnection` so an ingestion run can
//! perform all of its writes on one transaction.

mod read;
mod write;

pub use read::*;
pub use write::*;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::PersistenceError;
use crate::models::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS properties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        address TEXT NOT NULL,
        address_key TEXT NOT NULL,
        num_bedrooms INTEGER,
        num_bathrooms INTEGER,
        num_floors INTEGER,
        is_commercial BOOLEAN NOT NULL DEFAULT 0,
        property_type TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vendors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        contact_person TEXT,
        phone_number TEXT,
        email TEXT,
        address TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        lease_type TEXT NOT NULL,
        description TEXT,
        rent_amount_total REAL,
        rent_amount_monthly REAL,
        security_deposit_amount TEXT,
        security_deposit_held_by TEXT,
        start_date TEXT,
        end_date TEXT,
        payment_frequency TEXT NOT NULL,
        tenant_info TEXT,
        special_lease_terms TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER REFERENCES properties(id),
        lease_id INTEGER REFERENCES leases(id),
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        phone_number TEXT,
        date_of_birth TEXT,
        landlord TEXT,
        address TEXT,
        status TEXT NOT NULL DEFAULT 'current',
        match_key TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        vendor_id INTEGER REFERENCES vendors(id),
        invoice_number TEXT,
        amount REAL NOT NULL,
        paid_amount REAL NOT NULL DEFAULT 0,
        remaining_balance REAL NOT NULL,
        invoice_date TEXT,
        due_date TEXT,
        status TEXT NOT NULL,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoice_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        invoice_id INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        quantity REAL,
        unit_price REAL,
        total_price REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        vendor_id INTEGER REFERENCES vendors(id),
        invoice_id INTEGER UNIQUE REFERENCES invoices(id) ON DELETE SET NULL,
        category TEXT,
        amount REAL NOT NULL,
        transaction_date TEXT,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contracts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        vendor_id INTEGER REFERENCES vendors(id),
        contract_type TEXT NOT NULL,
        description TEXT,
        start_date TEXT,
        end_date TEXT,
        terms TEXT,
        parties_involved TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        property_id INTEGER REFERENCES properties(id),
        lease_id INTEGER REFERENCES leases(id),
        tenant_id INTEGER REFERENCES tenants(id),
        invoice_id INTEGER UNIQUE REFERENCES invoices(id),
        contract_id INTEGER REFERENCES contracts(id),
        document_type TEXT NOT NULL,
        description TEXT,
        upload_date TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_properties_owner_address ON properties(owner_id, address_key)",
    "CREATE INDEX IF NOT EXISTS idx_vendors_owner_name ON vendors(owner_id, name)",
    "CREATE INDEX IF NOT EXISTS idx_tenants_owner_key ON tenants(owner_id, match_key)",
    "CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice ON invoice_items(invoice_id)",
];

/// Matching form of an address: trimmed and case-folded.
///
/// Folding happens here rather than in SQL because SQLite's `lower()` only
/// knows ASCII.
pub fn address_key(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Matching form of a name: case-folded with all whitespace removed.
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Matching form of a tenant: first name, last name and landlord.
pub fn tenant_key(first_name: &str, last_name: &str, landlord: Option<&str>) -> String {
    format!(
        "{}\u{1f}{}\u{1f}{}",
        name_key(first_name),
        name_key(last_name),
        landlord.map(name_key).unwrap_or_default()
    )
}

/// Open a pool on the configured database and run migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, PersistenceError> {
    let url = config.effective_url();
    info!("Connecting to database: {}", url);

    let options = SqliteConnectOptions::from_str(&url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// A private in-memory database with the schema applied.
///
/// Single connection that never expires, so the data lives as long as the pool.
pub async fn memory() -> Result<SqlitePool, PersistenceError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> Result<(), PersistenceError> {
    info!("Running database migrations...");

    for statement in SCHEMA.iter().copied() {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Migrations complete");
    Ok(())
}
