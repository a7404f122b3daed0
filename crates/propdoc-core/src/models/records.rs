//! Canonical records produced by the field mapper.
//!
//! These are typed and ready for persistence: currency is `f64` or `None`,
//! dates are calendar dates or `None`, and required identifying text falls
//! back to [`NOT_FOUND`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel the reasoning service uses for an explicitly absent field.
pub const NOT_FOUND: &str = "Not Found";

/// A tenant named by a lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub landlord: Option<String>,
    pub address: Option<String>,
    pub status: String,
}

/// A property described by a lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub num_bedrooms: Option<i64>,
    pub num_bathrooms: Option<i64>,
    pub num_floors: Option<i64>,
    pub is_commercial: bool,
    pub property_type: String,
}

impl PropertyRecord {
    /// Whether the address identifies anything.
    pub fn has_address(&self) -> bool {
        let address = self.address.trim();
        !address.is_empty() && address != NOT_FOUND
    }
}

/// A vendor named by an invoice or contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub name: String,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub lease_type: String,
    pub description: Option<String>,
    pub rent_amount_total: Option<f64>,
    pub rent_amount_monthly: Option<f64>,
    pub security_deposit_amount: String,
    pub security_deposit_held_by: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payment_frequency: String,
    pub tenant: TenantRecord,
    pub special_lease_terms: Value,
    /// Only mapped when the caller did not name a property.
    pub property: Option<PropertyRecord>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub description: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub amount: f64,
    pub paid_amount: f64,
    /// Always `round(amount - paid_amount, 2)`.
    pub remaining_balance: f64,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub description: Option<String>,
    pub vendor: Option<VendorRecord>,
    pub line_items: Vec<LineItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_type: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub terms: Value,
    pub is_active: bool,
    pub vendor: Option<VendorRecord>,
    pub parties_involved: Vec<Value>,
}
