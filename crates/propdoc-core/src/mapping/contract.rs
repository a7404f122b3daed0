//! Contract field mapping.

use serde_json::{Map, Value};
use tracing::debug;

use super::invoice::map_vendor;
use super::values::{flag_or_true, parse_date, text_or, text_or_none};
use super::{ensure_not_empty, group};
use crate::error::MappingError;
use crate::models::FieldMap;
use crate::models::records::{ContractRecord, NOT_FOUND};

/// Map a key-normalized field map onto a [`ContractRecord`].
pub fn map_contract(fields: &FieldMap) -> Result<ContractRecord, MappingError> {
    ensure_not_empty(fields)?;

    let parties_involved = match fields.get("parties_involved") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(parties)) => parties.clone(),
        Some(single) => vec![single.clone()],
    };

    let terms = match fields.get("terms") {
        Some(terms @ (Value::Object(_) | Value::Array(_))) => terms.clone(),
        Some(Value::String(s)) if s.trim() != NOT_FOUND && !s.trim().is_empty() => {
            Value::String(s.clone())
        }
        _ => Value::Object(Map::new()),
    };

    let record = ContractRecord {
        contract_type: text_or(fields.get("contract_type"), NOT_FOUND),
        description: text_or_none(fields.get("description")),
        start_date: fields.get("start_date").and_then(parse_date),
        end_date: fields.get("end_date").and_then(parse_date),
        terms,
        is_active: flag_or_true(fields.get("is_active")),
        vendor: map_vendor(group(fields, "vendor_information")?),
        parties_involved,
    };

    debug!(
        "Mapped contract: type={}, {} parties, active={}",
        record.contract_type,
        record.parties_involved.len(),
        record.is_active
    );

    Ok(record)
}
