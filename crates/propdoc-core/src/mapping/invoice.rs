//! Invoice field mapping.

use serde_json::{Map, Value};
use tracing::debug;

use super::values::{clean_currency, parse_date, remaining_balance, text_or, text_or_none};
use super::{ensure_not_empty, group, type_name};
use crate::error::MappingError;
use crate::models::FieldMap;
use crate::models::records::{InvoiceRecord, LineItemRecord, NOT_FOUND, VendorRecord};

/// Map a key-normalized field map onto an [`InvoiceRecord`].
pub fn map_invoice(fields: &FieldMap) -> Result<InvoiceRecord, MappingError> {
    ensure_not_empty(fields)?;

    let amount = fields.get("amount").and_then(clean_currency).unwrap_or(0.0);
    let paid_amount = fields.get("paid_amount").and_then(clean_currency).unwrap_or(0.0);

    let line_items = match fields.get("line_items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| map_line_item(index, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::String(s)) if s.trim() == NOT_FOUND => Vec::new(),
        Some(other) => {
            return Err(MappingError::Shape {
                field: "line_items".to_string(),
                reason: format!("expected a list, got {}", type_name(other)),
            });
        }
    };

    let record = InvoiceRecord {
        invoice_number: text_or(fields.get("invoice_number"), NOT_FOUND),
        amount,
        paid_amount,
        remaining_balance: remaining_balance(amount, paid_amount),
        invoice_date: fields.get("invoice_date").and_then(parse_date),
        due_date: fields.get("due_date").and_then(parse_date),
        status: text_or(fields.get("status"), "Unpaid"),
        description: text_or_none(fields.get("description")),
        vendor: map_vendor(group(fields, "vendor_information")?),
        line_items,
    };

    debug!(
        "Mapped invoice {}: amount={}, paid={}, {} line items",
        record.invoice_number,
        record.amount,
        record.paid_amount,
        record.line_items.len()
    );

    Ok(record)
}

fn map_line_item(index: usize, item: &Value) -> Result<LineItemRecord, MappingError> {
    let item = item.as_object().ok_or_else(|| MappingError::Shape {
        field: format!("line_items[{index}]"),
        reason: format!("expected an object, got {}", type_name(item)),
    })?;

    // A missing quantity means one unit; a present but unreadable one is null.
    let quantity = match item.get("quantity") {
        None => Some(1.0),
        Some(value) => clean_currency(value),
    };

    Ok(LineItemRecord {
        description: text_or(item.get("description"), "No description"),
        quantity,
        unit_price: item.get("unit_price").and_then(clean_currency),
        total_price: item.get("total_price").and_then(clean_currency),
    })
}

/// Map a vendor group. Without a usable name there is nothing to resolve.
pub(crate) fn map_vendor(info: Option<&Map<String, Value>>) -> Option<VendorRecord> {
    let info = info?;
    let name = text_or_none(info.get("name"))?;

    Some(VendorRecord {
        name,
        address: text_or_none(info.get("address")),
        contact_person: text_or_none(info.get("contact_person")),
        phone_number: text_or_none(info.get("phone_number")),
        email: text_or_none(info.get("email")),
    })
}
