//! Persisted entities and the reloaded views returned to callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub owner_id: i64,
    pub address: String,
    pub num_bedrooms: Option<i64>,
    pub num_bathrooms: Option<i64>,
    pub num_floors: Option<i64>,
    pub is_commercial: bool,
    pub property_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Vendor {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Tenant {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: Option<i64>,
    pub lease_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub landlord: Option<String>,
    pub address: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Lease {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: i64,
    pub lease_type: String,
    pub description: Option<String>,
    pub rent_amount_total: Option<f64>,
    pub rent_amount_monthly: Option<f64>,
    pub security_deposit_amount: Option<String>,
    pub security_deposit_held_by: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payment_frequency: String,
    pub tenant_info: Option<Json<Value>>,
    pub special_lease_terms: Option<Json<Value>>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: i64,
    pub vendor_id: Option<i64>,
    pub invoice_number: Option<String>,
    pub amount: f64,
    pub paid_amount: f64,
    pub remaining_balance: f64,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
}

/// Expense mirroring an ingested invoice.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: i64,
    pub vendor_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub category: Option<String>,
    pub amount: f64,
    pub transaction_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: i64,
    pub vendor_id: Option<i64>,
    pub contract_type: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub terms: Option<Json<Value>>,
    pub parties_involved: Option<Json<Value>>,
    pub is_active: bool,
}

/// Linking record created once per successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: Option<i64>,
    pub lease_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub contract_id: Option<i64>,
    pub document_type: String,
    pub description: Option<String>,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaseView {
    #[serde(flatten)]
    pub lease: Lease,
    pub property: Property,
    pub tenants: Vec<Tenant>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceItem>,
    pub vendor: Option<Vendor>,
    pub expense: Option<Expense>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    #[serde(flatten)]
    pub contract: Contract,
    pub property: Property,
    pub vendor: Option<Vendor>,
    pub document: Option<Document>,
}

/// Primary record of a committed ingestion, reloaded with its relations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestedRecord {
    Lease(LeaseView),
    Invoice(InvoiceView),
    Contract(ContractView),
}

impl IngestedRecord {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The document record created alongside the primary record.
    pub fn document(&self) -> Option<&Document> {
        match self {
            IngestedRecord::Lease(view) => view.document.as_ref(),
            IngestedRecord::Invoice(view) => view.document.as_ref(),
            IngestedRecord::Contract(view) => view.document.as_ref(),
        }
    }
}
