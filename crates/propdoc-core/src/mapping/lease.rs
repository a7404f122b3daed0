//! Lease field mapping.

use serde_json::{Map, Value};
use tracing::debug;

use super::values::{
    clean_currency, flag_or_false, parse_date, text_or, text_or_none, to_int_or_none,
};
use super::{NOT_FOUND_VALUE, ensure_not_empty, get_nested_or, group};
use crate::error::MappingError;
use crate::models::FieldMap;
use crate::models::records::{LeaseRecord, NOT_FOUND, PropertyRecord, TenantRecord};

/// Map a key-normalized field map onto a [`LeaseRecord`].
///
/// The property sub-record is only mapped when `property_supplied` is false;
/// otherwise the caller's property identity wins.
pub fn map_lease(fields: &FieldMap, property_supplied: bool) -> Result<LeaseRecord, MappingError> {
    ensure_not_empty(fields)?;

    let root = Value::Object(fields.clone());
    let zero = Value::String("0".to_string());

    let tenant = map_tenant(group(fields, "tenant_information")?)?;

    let property = if property_supplied {
        None
    } else {
        Some(map_property(group(fields, "property_information")?))
    };

    let record = LeaseRecord {
        lease_type: text_or(fields.get("lease_type"), NOT_FOUND),
        description: text_or_none(fields.get("description")),
        rent_amount_total: clean_currency(get_nested_or(&root, &["rent_amount", "total"], &zero)),
        rent_amount_monthly: clean_currency(get_nested_or(
            &root,
            &["rent_amount", "monthly_installment"],
            &zero,
        )),
        security_deposit_amount: text_or(
            Some(get_nested_or(&root, &["security_deposit", "amount"], &NOT_FOUND_VALUE)),
            NOT_FOUND,
        ),
        security_deposit_held_by: text_or(
            Some(get_nested_or(&root, &["security_deposit", "held_by"], &NOT_FOUND_VALUE)),
            NOT_FOUND,
        ),
        start_date: fields.get("start_date").and_then(parse_date),
        end_date: fields.get("end_date").and_then(parse_date),
        payment_frequency: text_or(fields.get("payment_frequency"), "Monthly"),
        tenant,
        special_lease_terms: fields
            .get("special_lease_terms")
            .filter(|v| v.is_object() || v.is_array())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        property,
        is_active: true,
    };

    debug!(
        "Mapped lease: type={}, monthly={:?}, tenant={} {}",
        record.lease_type, record.rent_amount_monthly, record.tenant.first_name, record.tenant.last_name
    );

    Ok(record)
}

fn map_tenant(info: Option<&Map<String, Value>>) -> Result<TenantRecord, MappingError> {
    let get = |key: &str| info.and_then(|m| m.get(key));

    let first_name = text_or_none(get("first_name"))
        .and_then(|name| name.split_whitespace().next().map(str::to_string));
    let last_name = text_or_none(get("last_name"))
        .and_then(|name| name.split_whitespace().last().map(str::to_string));

    if first_name.is_none() && last_name.is_none() {
        return Err(MappingError::MissingField("tenant_information.name".to_string()));
    }

    Ok(TenantRecord {
        first_name: first_name.unwrap_or_else(|| NOT_FOUND.to_string()),
        last_name: last_name.unwrap_or_else(|| NOT_FOUND.to_string()),
        email: text_or_none(get("email")),
        phone_number: text_or_none(get("phone_number")),
        date_of_birth: get("date_of_birth").and_then(parse_date),
        landlord: text_or_none(get("landlord")),
        address: text_or_none(get("address")),
        status: text_or(get("status"), "current"),
    })
}

fn map_property(info: Option<&Map<String, Value>>) -> PropertyRecord {
    let get = |key: &str| info.and_then(|m| m.get(key));

    PropertyRecord {
        address: text_or(get("address"), NOT_FOUND),
        num_bedrooms: to_int_or_none(get("num_bedrooms")),
        num_bathrooms: to_int_or_none(get("num_bathrooms")),
        num_floors: to_int_or_none(get("num_floors")),
        is_commercial: flag_or_false(get("is_commercial")),
        property_type: text_or(get("property_type"), "residential"),
    }
}
